use k8s_openapi::{
    api::core::v1::{Namespace, Secret},
    apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition,
};
use kube::{
    Api, Client,
    api::{DeleteParams, DynamicObject, PostParams},
    discovery::ApiResource,
};
use serde_json::json;

pub struct TestResources {
    pub client: Client,
    pub namespace: String,
}

impl TestResources {
    pub fn new(client: Client, namespace: &str) -> Self {
        Self {
            client,
            namespace: namespace.to_string(),
        }
    }

    pub fn crontab_resource() -> ApiResource {
        ApiResource {
            group: "stable.example.com".to_string(),
            version: "v1".to_string(),
            api_version: "stable.example.com/v1".to_string(),
            kind: "CronTab".to_string(),
            plural: "crontabs".to_string(),
        }
    }

    pub async fn install_crontab_crd(&self) -> Result<(), Box<dyn std::error::Error>> {
        let crd: CustomResourceDefinition = serde_json::from_value(json!({
            "apiVersion": "apiextensions.k8s.io/v1",
            "kind": "CustomResourceDefinition",
            "metadata": {"name": "crontabs.stable.example.com"},
            "spec": {
                "group": "stable.example.com",
                "scope": "Namespaced",
                "names": {"plural": "crontabs", "singular": "crontab", "kind": "CronTab"},
                "versions": [{
                    "name": "v1",
                    "served": true,
                    "storage": true,
                    "schema": {"openAPIV3Schema": {
                        "type": "object",
                        "x-kubernetes-preserve-unknown-fields": true
                    }}
                }]
            }
        }))?;
        let crds: Api<CustomResourceDefinition> = Api::all(self.client.clone());
        match crds.create(&PostParams::default(), &crd).await {
            Ok(_) => {}
            Err(kube::Error::Api(ae)) if ae.code == 409 => {}
            Err(e) => return Err(e.into()),
        }

        for _ in 0..60 {
            let established = crds
                .get("crontabs.stable.example.com")
                .await?
                .status
                .and_then(|s| s.conditions)
                .unwrap_or_default()
                .iter()
                .any(|c| c.type_ == "Established" && c.status == "True");
            if established {
                return Ok(());
            }
            tokio::time::sleep(tokio::time::Duration::from_secs(1)).await;
        }
        Err("CronTab CRD was not established in time".into())
    }

    pub async fn get_crontab(
        &self,
        name: &str,
    ) -> Result<Option<DynamicObject>, Box<dyn std::error::Error>> {
        let api: Api<DynamicObject> =
            Api::namespaced_with(self.client.clone(), &self.namespace, &Self::crontab_resource());
        Ok(api.get_opt(name).await?)
    }

    pub async fn get_secret(
        &self,
        name: &str,
    ) -> Result<Option<Secret>, Box<dyn std::error::Error>> {
        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), &self.namespace);
        Ok(secrets.get_opt(name).await?)
    }

    pub async fn namespace_exists(&self) -> Result<bool, Box<dyn std::error::Error>> {
        let namespaces: Api<Namespace> = Api::all(self.client.clone());
        Ok(namespaces.get_opt(&self.namespace).await?.is_some())
    }

    pub async fn cleanup(&self) -> Result<(), Box<dyn std::error::Error>> {
        let namespaces: Api<Namespace> = Api::all(self.client.clone());
        match namespaces
            .delete(&self.namespace, &DeleteParams::default())
            .await
        {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(ae)) if ae.code == 404 => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
