//! Blocking PVE API client.

use crate::models::{Node, VersionInfo};
use crate::Result;
#[cfg(test)]
use pve2_core::Transport;
use pve2_core::{Dispatcher, Error, FormParams, HttpTransport, Pve2Config};
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, warn};

/// Blocking client for one PVE cluster node.
///
/// Holds the connection identity and the cluster node-name cache; every
/// call delegates to the dispatcher for one synchronous round trip. The
/// cache belongs to this instance alone and is only ever replaced by an
/// explicit reload.
pub struct Pve2Client {
    dispatcher: Dispatcher,
    node_cache: Option<Vec<String>>,
}

impl Pve2Client {
    /// Create a client from the connection identity.
    ///
    /// Validates the configuration exactly once, precomputes the credential
    /// header value and builds the HTTP transport. Performs no API request;
    /// the only lookup is the host-resolution check.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for any invalid construction input; the
    /// credential is not composed in that case.
    pub fn new(config: Pve2Config) -> Result<Self> {
        config.ensure_valid()?;
        let transport = Box::new(HttpTransport::new(&config)?);
        Ok(Self {
            dispatcher: Dispatcher::new(&config, transport),
            node_cache: None,
        })
    }

    #[cfg(test)]
    pub(crate) fn with_transport(
        config: &Pve2Config,
        transport: Box<dyn Transport>,
    ) -> Result<Self> {
        config.ensure_valid()?;
        Ok(Self {
            dispatcher: Dispatcher::new(config, transport),
            node_cache: None,
        })
    }

    /// `GET` the resource at `path`.
    ///
    /// `Ok(None)` means the server answered 200 with no usable `data`
    /// field, which is distinct from every error.
    ///
    /// # Errors
    ///
    /// Propagates dispatcher failures unchanged.
    pub fn get(&self, path: &str) -> Result<Option<Value>> {
        Ok(self
            .dispatcher
            .dispatch(path, Method::GET, None)?
            .into_data())
    }

    /// `PUT` `params` to the resource at `path`. Success carries no
    /// payload.
    ///
    /// # Errors
    ///
    /// Propagates dispatcher failures unchanged.
    pub fn put(&self, path: &str, params: &FormParams) -> Result<()> {
        self.dispatcher.dispatch(path, Method::PUT, Some(params))?;
        Ok(())
    }

    /// `POST` `params` to the resource at `path`.
    ///
    /// # Errors
    ///
    /// Propagates dispatcher failures unchanged.
    pub fn post(&self, path: &str, params: &FormParams) -> Result<Option<Value>> {
        Ok(self
            .dispatcher
            .dispatch(path, Method::POST, Some(params))?
            .into_data())
    }

    /// `DELETE` the resource at `path`.
    ///
    /// # Errors
    ///
    /// Propagates dispatcher failures unchanged.
    pub fn delete(&self, path: &str) -> Result<Option<Value>> {
        Ok(self
            .dispatcher
            .dispatch(path, Method::DELETE, None)?
            .into_data())
    }

    /// Refresh the node-name cache from `GET /nodes`.
    ///
    /// A non-empty listing replaces the cache with each entry's node name
    /// in source order. An empty listing leaves the cache untouched.
    ///
    /// # Errors
    ///
    /// [`Error::EmptyNodeList`] when the cluster reports zero nodes,
    /// [`Error::MissingData`] when the payload is not a node listing, and
    /// dispatcher failures unchanged.
    pub fn reload_node_list(&mut self) -> Result<()> {
        let nodes: Vec<Node> = match self.get("/nodes")? {
            Some(value) => serde_json::from_value(value)
                .map_err(|err| Error::MissingData(format!("unexpected /nodes payload: {err}")))?,
            None => Vec::new(),
        };

        if nodes.is_empty() {
            warn!("cluster returned an empty node list");
            return Err(Error::EmptyNodeList);
        }

        let names: Vec<String> = nodes.into_iter().map(|node| node.node).collect();
        debug!(nodes = ?names, "node list reloaded");
        self.node_cache = Some(names);
        Ok(())
    }

    /// The cluster node names, reloading lazily on first use.
    ///
    /// A populated cache is returned without a round trip; only an explicit
    /// [`reload_node_list`](Self::reload_node_list) refreshes it.
    ///
    /// # Errors
    ///
    /// Propagates [`reload_node_list`](Self::reload_node_list) failures
    /// when the cache is unpopulated.
    pub fn get_node_list(&mut self) -> Result<&[String]> {
        if self.node_cache.is_none() {
            self.reload_node_list()?;
        }

        Ok(self.node_cache.as_deref().unwrap_or(&[]))
    }

    /// The next free VMID in the cluster, from `GET /cluster/nextid`.
    ///
    /// The API reports the id as a string of digits; a plain number is
    /// accepted too.
    ///
    /// # Errors
    ///
    /// [`Error::MissingData`] when the payload is empty, null, or not a
    /// numeric id; dispatcher failures unchanged.
    pub fn get_next_vmid(&self) -> Result<u32> {
        match self.get("/cluster/nextid")? {
            Some(Value::String(id)) => id
                .parse()
                .map_err(|_| Error::MissingData(format!("`{id}` is not a numeric VMID"))),
            Some(Value::Number(id)) => id
                .as_u64()
                .and_then(|id| u32::try_from(id).ok())
                .ok_or_else(|| Error::MissingData(format!("`{id}` is not a numeric VMID"))),
            _ => Err(Error::MissingData(
                "cluster/nextid returned no id".to_string(),
            )),
        }
    }

    /// The server version string, from `GET /version`.
    ///
    /// # Errors
    ///
    /// [`Error::MissingData`] when the payload is empty, null, or carries
    /// no version field; dispatcher failures unchanged.
    pub fn get_version(&self) -> Result<String> {
        match self.get("/version")? {
            Some(value) => {
                let info: VersionInfo = serde_json::from_value(value).map_err(|err| {
                    Error::MissingData(format!("unexpected /version payload: {err}"))
                })?;
                Ok(info.version)
            }
            None => Err(Error::MissingData(
                "version endpoint returned no data".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::{mock, Sequence};
    use pve2_core::ApiRequest;
    use serde_json::json;

    mock! {
        pub Transport {}

        impl Transport for Transport {
            fn send(&self, request: &ApiRequest) -> pve2_core::Result<Vec<u8>>;
        }
    }

    fn config() -> Pve2Config {
        Pve2Config::new("10.0.0.5", "root", "pam", "mytoken", "abcd-1234").unwrap()
    }

    fn ok_wire(body: &str) -> Vec<u8> {
        format!("HTTP/1.1 200 OK\r\nContent-Type: application/json;charset=UTF-8\r\n\r\n{body}")
            .into_bytes()
    }

    fn client_with(transport: MockTransport) -> Pve2Client {
        Pve2Client::with_transport(&config(), Box::new(transport)).unwrap()
    }

    #[test]
    fn construction_performs_no_request() {
        let mut transport = MockTransport::new();
        transport.expect_send().never();
        let _client = client_with(transport);
    }

    #[test]
    fn construction_rejects_out_of_range_port() {
        let result = Pve2Client::new(config().with_port(70000));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn construction_succeeds_for_valid_identity() {
        assert!(Pve2Client::new(config()).is_ok());
    }

    #[test]
    fn get_version_returns_version_string() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|request| request.url.as_str() == "https://10.0.0.5:8006/api2/json/version")
            .times(1)
            .returning(|_| {
                Ok(ok_wire(
                    r#"{"data":{"version":"7.4-3","release":"7.4","repoid":"9002ab8a"}}"#,
                ))
            });

        let client = client_with(transport);
        assert_eq!(client.get_version().unwrap(), "7.4-3");
    }

    #[test]
    fn get_version_maps_null_data_to_missing_data() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .times(1)
            .returning(|_| Ok(ok_wire(r#"{"data":null}"#)));

        let client = client_with(transport);
        assert!(matches!(client.get_version(), Err(Error::MissingData(_))));
    }

    #[test]
    fn get_next_vmid_parses_string_id() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|request| {
                request.url.as_str() == "https://10.0.0.5:8006/api2/json/cluster/nextid"
            })
            .times(1)
            .returning(|_| Ok(ok_wire(r#"{"data":"100"}"#)));

        let client = client_with(transport);
        assert_eq!(client.get_next_vmid().unwrap(), 100);
    }

    #[test]
    fn get_next_vmid_accepts_numeric_id() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .times(1)
            .returning(|_| Ok(ok_wire(r#"{"data":214}"#)));

        let client = client_with(transport);
        assert_eq!(client.get_next_vmid().unwrap(), 214);
    }

    #[test]
    fn get_next_vmid_maps_empty_payload_to_missing_data() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .times(1)
            .returning(|_| Ok(ok_wire(r#"{"data":null}"#)));

        let client = client_with(transport);
        assert!(matches!(client.get_next_vmid(), Err(Error::MissingData(_))));
    }

    #[test]
    fn node_list_is_fetched_once_and_cached() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|request| request.url.as_str() == "https://10.0.0.5:8006/api2/json/nodes")
            .times(1)
            .returning(|_| {
                Ok(ok_wire(
                    r#"{"data":[{"node":"pve1","status":"online"},{"node":"pve2","status":"online"},{"node":"pve3","status":"offline"}]}"#,
                ))
            });

        let mut client = client_with(transport);
        assert_eq!(client.get_node_list().unwrap(), ["pve1", "pve2", "pve3"]);
        // second call is served from the cache; the mock enforces times(1)
        assert_eq!(client.get_node_list().unwrap(), ["pve1", "pve2", "pve3"]);
    }

    #[test]
    fn empty_node_list_fails_and_leaves_cache_unset() {
        let mut seq = Sequence::new();
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(ok_wire(r#"{"data":[]}"#)));
        transport
            .expect_send()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(ok_wire(r#"{"data":[{"node":"pve1"}]}"#)));

        let mut client = client_with(transport);
        assert_eq!(client.get_node_list().err(), Some(Error::EmptyNodeList));
        // the failed reload never populated the cache, so the next call retries
        assert_eq!(client.get_node_list().unwrap(), ["pve1"]);
    }

    #[test]
    fn reload_replaces_an_already_populated_cache() {
        let mut seq = Sequence::new();
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(ok_wire(r#"{"data":[{"node":"pve1"}]}"#)));
        transport
            .expect_send()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(ok_wire(r#"{"data":[{"node":"pve1"},{"node":"pve4"}]}"#)));

        let mut client = client_with(transport);
        assert_eq!(client.get_node_list().unwrap(), ["pve1"]);
        client.reload_node_list().unwrap();
        assert_eq!(client.get_node_list().unwrap(), ["pve1", "pve4"]);
    }

    #[test]
    fn put_succeeds_without_payload() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|request| {
                request.method == Method::PUT
                    && request.body.as_deref() == Some("cores=4")
            })
            .times(1)
            .returning(|_| Ok(ok_wire(r#"{"data":{"ignored":true}}"#)));

        let mut params = FormParams::new();
        params.push("cores", 4);

        let client = client_with(transport);
        assert_eq!(client.put("/nodes/pve1/qemu/100/config", &params), Ok(()));
    }

    #[test]
    fn rejected_status_surfaces_for_caller_branching() {
        let mut transport = MockTransport::new();
        transport.expect_send().times(1).returning(|_| {
            Ok(b"HTTP/1.1 401 Unauthorized\r\n\r\n{\"data\":null}".to_vec())
        });

        let client = client_with(transport);
        let err = client.get("/version").unwrap_err();
        assert_eq!(err.status(), Some(401));
    }

    #[test]
    fn post_returns_task_payload() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|request| request.method == Method::POST)
            .times(1)
            .returning(|_| Ok(ok_wire(r#"{"data":"UPID:pve1:000C2D7A"}"#)));

        let mut params = FormParams::new();
        params.push("vmid", 100);

        let client = client_with(transport);
        assert_eq!(
            client.post("/nodes/pve1/qemu", &params).unwrap(),
            Some(json!("UPID:pve1:000C2D7A"))
        );
    }

    #[test]
    fn delete_distinguishes_empty_data_from_failure() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|request| request.method == Method::DELETE && request.body.is_none())
            .times(1)
            .returning(|_| Ok(ok_wire(r#"{"data":null}"#)));

        let client = client_with(transport);
        assert_eq!(client.delete("/nodes/pve1/qemu/100").unwrap(), None);
    }
}
