//! The async client facade.
//!
//! `Client` creates resources, references and search sets locally, and runs
//! the transport-dependent operations (read, fetch, save, delete, count,
//! reference resolution) as one [`Transport::send`] call each. Pagination
//! requests page N+1 only after page N has been consumed.

use std::sync::Arc;

use futures_util::stream::{self, Stream, TryStreamExt};
use serde_json::Value;
use tracing::{debug, warn};

use crate::bundle::Page;
use crate::cache::ResourceCache;
use crate::error::{Error, Result};
use crate::node::Node;
use crate::reference::{Reference, ReferenceBuilder, ReferenceTarget};
use crate::search::SearchSet;
use crate::transport::{Request, Transport};

const BUNDLE: &str = "Bundle";
const TOTAL_METHOD: &str = "_totalMethod";

/// Entry point for working with one backend.
pub struct Client<T> {
    transport: Arc<T>,
    cache: Option<Arc<ResourceCache>>,
}

impl<T> Clone for Client<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            cache: self.cache.clone(),
        }
    }
}

impl<T: Transport> Client<T> {
    pub fn new(transport: T) -> Self {
        Self::from_arc(Arc::new(transport))
    }

    pub fn from_arc(transport: Arc<T>) -> Self {
        Self {
            transport,
            cache: None,
        }
    }

    /// Enables the resource cache used by [`Client::to_resource`].
    #[must_use]
    pub fn with_cache(mut self) -> Self {
        self.cache = Some(Arc::new(ResourceCache::new()));
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn cache(&self) -> Option<&ResourceCache> {
        self.cache.as_deref()
    }

    pub fn clear_resources_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }

    /// A fresh resource of `resource_type`, without an id.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidArgument` if `resource_type` is empty.
    pub fn resource(&self, resource_type: &str) -> Result<Node> {
        Node::resource(resource_type)
    }

    /// Parses a `Type/id` or absolute reference string.
    pub fn reference(&self, reference: &str) -> Result<Reference> {
        Reference::parse(reference)
    }

    /// Starts a reference from type and id, or from a string.
    pub fn reference_builder(&self) -> ReferenceBuilder {
        Reference::builder()
    }

    pub fn resources(&self, resource_type: &str) -> SearchSet {
        SearchSet::new(resource_type)
    }

    /// Sends a raw request and returns the response body unmodified.
    pub async fn send(&self, request: Request) -> Result<Value> {
        self.transport.send(request).await
    }

    pub async fn read(&self, resource_type: &str, id: &str) -> Result<Node> {
        debug!(resource_type = %resource_type, id = %id, "reading resource");
        let response = self
            .send(Request::get(format!("{resource_type}/{id}")))
            .await?;
        if response.is_null() {
            return Err(Error::resource_not_found(resource_type, id));
        }
        resource_from_response(response)
    }

    /// Fetches the page of results `search` points at.
    pub async fn fetch_page(&self, search: &SearchSet) -> Result<Page> {
        debug!(
            resource_type = %search.resource_type(),
            page = ?search.page_number(),
            "fetching search page"
        );
        let request = Request::get(search.resource_type()).with_query(search.to_query_pairs());
        Page::from_bundle(self.send(request).await?)
    }

    /// Fetches one page of results.
    pub async fn fetch(&self, search: &SearchSet) -> Result<Vec<Node>> {
        Ok(self.fetch_page(search).await?.resources)
    }

    /// Fetches every page of results.
    pub async fn fetch_all(&self, search: &SearchSet) -> Result<Vec<Node>> {
        self.stream(search).try_collect().await
    }

    /// Lazily walks every page of results, in page order.
    ///
    /// Starts at the page set on `search` (or 1) and stops once a page comes
    /// back empty or without a `next` link. Dropping the stream stops it.
    pub fn stream<'a>(
        &'a self,
        search: &SearchSet,
    ) -> impl Stream<Item = Result<Node>> + use<'a, T> {
        let first = search.page_number().unwrap_or(1);
        stream::try_unfold(Some((search.clone(), first)), move |state| async move {
            let Some((search, number)) = state else {
                return Ok(None);
            };
            let page = self.fetch_page(&search.page(number)).await?;
            let next = (page.has_next && !page.is_empty()).then(|| (search, number + 1));
            Ok::<_, Error>(Some((stream::iter(page.resources.into_iter().map(Ok)), next)))
        })
        .try_flatten()
    }

    /// The first match, if any.
    pub async fn first(&self, search: &SearchSet) -> Result<Option<Node>> {
        Ok(self.fetch(&search.limit(1)).await?.into_iter().next())
    }

    /// The single match.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` when nothing matches and
    /// `Error::MultipleResults` when more than one resource does.
    pub async fn get(&self, search: &SearchSet) -> Result<Node> {
        let mut found = self.fetch(&search.limit(2)).await?;
        match found.len() {
            0 => Err(Error::not_found(search.to_string())),
            1 => Ok(found.remove(0)),
            _ => Err(Error::multiple_results(search.resource_type())),
        }
    }

    /// Number of matches, as reported by the bundle `total`.
    pub async fn count(&self, search: &SearchSet) -> Result<u64> {
        let search = search.limit(0).param(TOTAL_METHOD, "count");
        let page = self.fetch_page(&search).await?;
        Ok(page.total.unwrap_or_default())
    }

    /// Creates or updates `node` and refreshes it from the response.
    ///
    /// Nodes with an id are PUT to `Type/id`, others are POSTed to `Type`.
    /// A Bundle is POSTed to the backend root as a transaction.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidArgument` if `node` has no resource type.
    pub async fn save(&self, node: &mut Node) -> Result<()> {
        let resource_type = node
            .resource_type()
            .ok_or_else(|| Error::invalid_argument("only resources can be saved"))?
            .to_string();
        let body = node.to_json();

        let request = if resource_type == BUNDLE {
            Request::post("", body)
        } else {
            match node.id() {
                Some(id) => Request::put(format!("{resource_type}/{id}"), body),
                None => Request::post(resource_type.as_str(), body),
            }
        };
        debug!(resource_type = %resource_type, method = %request.method, "saving resource");

        let response = self.send(request).await?;
        match response {
            Value::Object(map) => node.replace_with(Node::from_map(map)),
            Value::Null => {}
            other => warn!(
                resource_type = %resource_type,
                "unexpected save response: {}",
                other
            ),
        }

        if let (Some(cache), Some(id)) = (&self.cache, node.id()) {
            cache.invalidate(&resource_type, id);
        }
        Ok(())
    }

    /// Deletes the resource `node` names.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidArgument` if `node` has no type or no id.
    pub async fn delete(&self, node: &Node) -> Result<()> {
        let (resource_type, id) = identity(node)?;
        debug!(resource_type = %resource_type, id = %id, "deleting resource");
        self.send(Request::delete(format!("{resource_type}/{id}")))
            .await?;
        if let Some(cache) = &self.cache {
            cache.invalidate(resource_type, id);
        }
        Ok(())
    }

    /// Reloads `node` from the backend.
    pub async fn refresh(&self, node: &mut Node) -> Result<()> {
        let (resource_type, id) = identity(node)?;
        let fresh = self.read(resource_type, id).await?;
        node.replace_with(fresh);
        Ok(())
    }

    /// Asks the backend to validate `node` without storing it.
    ///
    /// A rejection with an OperationOutcome yields `false`; other failures are
    /// returned as errors.
    pub async fn is_valid(&self, node: &Node) -> Result<bool> {
        let resource_type = node
            .resource_type()
            .ok_or_else(|| Error::invalid_argument("only resources can be validated"))?;
        let request = Request::post(format!("{resource_type}/$validate"), node.to_json());
        match self.send(request).await {
            Ok(_) => Ok(true),
            Err(err) if err.is_validation() => {
                debug!(resource_type = %resource_type, error = %err, "resource is not valid");
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    /// POSTs `data` to `path` and returns the raw response.
    pub async fn execute(&self, path: &str, data: Value) -> Result<Value> {
        self.send(Request::post(path.trim_start_matches('/'), data))
            .await
    }

    /// Runs the `$operation` of `resource_type`.
    pub async fn execute_operation(
        &self,
        resource_type: &str,
        operation: &str,
        data: Value,
    ) -> Result<Value> {
        let operation = operation.trim_start_matches('$');
        self.execute(&format!("{resource_type}/${operation}"), data)
            .await
    }

    /// Loads the resource a reference names.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` for an external reference without making a
    /// request, and `Error::InvalidArgument` for a local reference missing
    /// its type or id.
    pub async fn to_resource(&self, reference: &Reference) -> Result<Node> {
        match reference.target() {
            Some(ReferenceTarget::External { url }) => Err(Error::not_found(format!(
                "external reference {url} cannot be resolved"
            ))),
            Some(ReferenceTarget::Local { resource_type, id }) => {
                if let Some(node) = self.cache.as_ref().and_then(|c| c.get(resource_type, id)) {
                    return Ok(node);
                }
                let node = self.read(resource_type, id).await?;
                if let Some(cache) = &self.cache {
                    cache.insert(&node);
                }
                Ok(node)
            }
            None => Err(Error::invalid_argument(
                "reference needs a resource type and id",
            )),
        }
    }
}

fn identity(node: &Node) -> Result<(&str, &str)> {
    match (node.resource_type(), node.id()) {
        (Some(resource_type), Some(id)) => Ok((resource_type, id)),
        (None, _) => Err(Error::invalid_argument("node is not a resource")),
        (Some(resource_type), None) => Err(Error::invalid_argument(format!(
            "{resource_type} has no id"
        ))),
    }
}

fn resource_from_response(response: Value) -> Result<Node> {
    match response {
        Value::Object(map) => Ok(Node::from_map(map)),
        other => Err(Error::transport(
            None,
            format!("expected a resource, got {other}"),
        )),
    }
}
