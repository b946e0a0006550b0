use async_trait::async_trait;
use futures::{StreamExt, stream::BoxStream};
use k8s_openapi::api::core::v1::Namespace;
use kube::{
    Client,
    api::{Api, DeleteParams, DynamicObject, ObjectMeta, PostParams, WatchEvent, WatchParams},
    discovery::ApiResource,
};
use tracing::debug;

use crate::error::StoreError;

/// A change observed on a watched resource type.
#[derive(Debug, Clone)]
pub enum StoreEvent {
    Applied(DynamicObject),
    Deleted(DynamicObject),
}

impl StoreEvent {
    pub fn object(&self) -> &DynamicObject {
        match self {
            StoreEvent::Applied(obj) | StoreEvent::Deleted(obj) => obj,
        }
    }
}

/// Ends when the store closes the watch.
pub type EventStream = BoxStream<'static, Result<StoreEvent, StoreError>>;

/// Untyped access to the live resource store. Every call is keyed by the resource type
/// and, for namespaced kinds, the namespace; `None` addresses cluster-scoped objects.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    async fn create_namespace(&self, name: &str) -> Result<(), StoreError>;

    async fn create(
        &self,
        ar: &ApiResource,
        namespace: Option<&str>,
        obj: &DynamicObject,
    ) -> Result<DynamicObject, StoreError>;

    async fn get(
        &self,
        ar: &ApiResource,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<DynamicObject, StoreError>;

    /// Full replacement guarded by the version token carried in `obj`.
    async fn replace(
        &self,
        ar: &ApiResource,
        namespace: Option<&str>,
        obj: &DynamicObject,
    ) -> Result<DynamicObject, StoreError>;

    async fn delete(
        &self,
        ar: &ApiResource,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<(), StoreError>;

    /// Watches every instance of the type across all namespaces.
    async fn watch(&self, ar: &ApiResource) -> Result<EventStream, StoreError>;
}

#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl KubeStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, ar: &ApiResource, namespace: Option<&str>) -> Api<DynamicObject> {
        match namespace {
            Some(ns) => Api::namespaced_with(self.client.clone(), ns, ar),
            None => Api::all_with(self.client.clone(), ar),
        }
    }
}

#[async_trait]
impl ResourceStore for KubeStore {
    async fn create_namespace(&self, name: &str) -> Result<(), StoreError> {
        let namespace = Namespace {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let namespaces: Api<Namespace> = Api::all(self.client.clone());
        namespaces.create(&PostParams::default(), &namespace).await?;
        Ok(())
    }

    async fn create(
        &self,
        ar: &ApiResource,
        namespace: Option<&str>,
        obj: &DynamicObject,
    ) -> Result<DynamicObject, StoreError> {
        Ok(self
            .api(ar, namespace)
            .create(&PostParams::default(), obj)
            .await?)
    }

    async fn get(
        &self,
        ar: &ApiResource,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<DynamicObject, StoreError> {
        Ok(self.api(ar, namespace).get(name).await?)
    }

    async fn replace(
        &self,
        ar: &ApiResource,
        namespace: Option<&str>,
        obj: &DynamicObject,
    ) -> Result<DynamicObject, StoreError> {
        let name = obj.metadata.name.clone().unwrap_or_default();
        Ok(self
            .api(ar, namespace)
            .replace(&name, &PostParams::default(), obj)
            .await?)
    }

    async fn delete(
        &self,
        ar: &ApiResource,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<(), StoreError> {
        self.api(ar, namespace)
            .delete(name, &DeleteParams::default())
            .await?;
        Ok(())
    }

    async fn watch(&self, ar: &ApiResource) -> Result<EventStream, StoreError> {
        let mut events = self
            .api(ar, None)
            .watch(&WatchParams::default(), "0")
            .await?
            .boxed();

        let stream = async_stream::stream! {
            while let Some(event) = events.next().await {
                match event {
                    Ok(WatchEvent::Added(obj)) | Ok(WatchEvent::Modified(obj)) => {
                        yield Ok(StoreEvent::Applied(obj));
                    }
                    Ok(WatchEvent::Deleted(obj)) => yield Ok(StoreEvent::Deleted(obj)),
                    Ok(WatchEvent::Bookmark(bookmark)) => {
                        debug!(
                            resource_version = %bookmark.metadata.resource_version,
                            "watch bookmark"
                        );
                    }
                    Ok(WatchEvent::Error(err)) => {
                        yield Err(StoreError::from(kube::Error::Api(err)));
                    }
                    Err(err) => yield Err(StoreError::from(err)),
                }
            }
        };
        Ok(stream.boxed())
    }
}
