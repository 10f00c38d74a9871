//! Blocking adapter over [`Client`].
//!
//! Each call drives the async client to completion on a current-thread
//! runtime owned by the adapter. Do not call it from inside an async context.

use futures_util::StreamExt;
use futures_util::stream::LocalBoxStream;
use serde_json::Value;
use tokio::runtime::{Builder, Runtime};

use crate::bundle::Page;
use crate::client::Client;
use crate::error::{Error, Result};
use crate::node::Node;
use crate::reference::{Reference, ReferenceBuilder};
use crate::search::SearchSet;
use crate::transport::{Request, Transport};

pub struct BlockingClient<T> {
    inner: Client<T>,
    runtime: Runtime,
}

impl<T: Transport> BlockingClient<T> {
    /// # Errors
    ///
    /// Returns `Error::Transport` if the runtime cannot be started.
    pub fn new(transport: T) -> Result<Self> {
        Self::from_client(Client::new(transport))
    }

    pub fn from_client(inner: Client<T>) -> Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::transport(None, format!("failed to start runtime: {e}")))?;
        Ok(Self { inner, runtime })
    }

    /// The async client this adapter drives.
    pub fn async_client(&self) -> &Client<T> {
        &self.inner
    }

    pub fn clear_resources_cache(&self) {
        self.inner.clear_resources_cache();
    }

    pub fn resource(&self, resource_type: &str) -> Result<Node> {
        self.inner.resource(resource_type)
    }

    pub fn reference(&self, reference: &str) -> Result<Reference> {
        self.inner.reference(reference)
    }

    pub fn reference_builder(&self) -> ReferenceBuilder {
        self.inner.reference_builder()
    }

    pub fn resources(&self, resource_type: &str) -> SearchSet {
        self.inner.resources(resource_type)
    }

    pub fn send(&self, request: Request) -> Result<Value> {
        self.runtime.block_on(self.inner.send(request))
    }

    pub fn read(&self, resource_type: &str, id: &str) -> Result<Node> {
        self.runtime.block_on(self.inner.read(resource_type, id))
    }

    pub fn fetch_page(&self, search: &SearchSet) -> Result<Page> {
        self.runtime.block_on(self.inner.fetch_page(search))
    }

    pub fn fetch(&self, search: &SearchSet) -> Result<Vec<Node>> {
        self.runtime.block_on(self.inner.fetch(search))
    }

    pub fn fetch_all(&self, search: &SearchSet) -> Result<Vec<Node>> {
        self.runtime.block_on(self.inner.fetch_all(search))
    }

    /// Lazily walks every page of results; see [`Client::stream`].
    pub fn iter(&self, search: &SearchSet) -> ResourceIter<'_> {
        ResourceIter {
            runtime: &self.runtime,
            stream: self.inner.stream(search).boxed_local(),
        }
    }

    pub fn first(&self, search: &SearchSet) -> Result<Option<Node>> {
        self.runtime.block_on(self.inner.first(search))
    }

    pub fn get(&self, search: &SearchSet) -> Result<Node> {
        self.runtime.block_on(self.inner.get(search))
    }

    pub fn count(&self, search: &SearchSet) -> Result<u64> {
        self.runtime.block_on(self.inner.count(search))
    }

    pub fn save(&self, node: &mut Node) -> Result<()> {
        self.runtime.block_on(self.inner.save(node))
    }

    pub fn delete(&self, node: &Node) -> Result<()> {
        self.runtime.block_on(self.inner.delete(node))
    }

    pub fn refresh(&self, node: &mut Node) -> Result<()> {
        self.runtime.block_on(self.inner.refresh(node))
    }

    pub fn is_valid(&self, node: &Node) -> Result<bool> {
        self.runtime.block_on(self.inner.is_valid(node))
    }

    pub fn execute(&self, path: &str, data: Value) -> Result<Value> {
        self.runtime.block_on(self.inner.execute(path, data))
    }

    pub fn execute_operation(
        &self,
        resource_type: &str,
        operation: &str,
        data: Value,
    ) -> Result<Value> {
        self.runtime
            .block_on(self.inner.execute_operation(resource_type, operation, data))
    }

    pub fn to_resource(&self, reference: &Reference) -> Result<Node> {
        self.runtime.block_on(self.inner.to_resource(reference))
    }
}

/// Blocking iterator over search results, fetching pages on demand.
pub struct ResourceIter<'a> {
    runtime: &'a Runtime,
    stream: LocalBoxStream<'a, Result<Node>>,
}

impl Iterator for ResourceIter<'_> {
    type Item = Result<Node>;

    fn next(&mut self) -> Option<Self::Item> {
        self.runtime.block_on(self.stream.next())
    }
}
