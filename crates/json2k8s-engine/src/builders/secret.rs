//! Secret manifests

use std::collections::BTreeMap;

use json2k8s_core::{SecretDelivery, SecretRef, naming};
use k8s_openapi::ByteString;
use k8s_openapi::api::core::v1::Secret;

use crate::context::BuildContext;
use crate::error::{EngineError, Result};

/// Data key a secret reference is stored under
pub fn secret_data_key(secret: &SecretRef) -> String {
    match &secret.delivery {
        SecretDelivery::EnvVar { key } => key.clone(),
        SecretDelivery::File { file_name, .. } => naming::file_secret_key(file_name),
    }
}

/// Build the `<resource>-secrets` object holding every referenced value
///
/// Fails on the first reference whose `source` is missing from the resolved
/// mapping.
pub fn build_secret<'s>(
    ctx: &BuildContext<'_>,
    resource: &str,
    replica_group: Option<&str>,
    secrets: impl IntoIterator<Item = &'s SecretRef>,
) -> Result<Secret> {
    let mut data = BTreeMap::new();
    for secret in secrets {
        let value = ctx
            .secrets
            .get(&secret.source)
            .ok_or_else(|| EngineError::MissingSecret {
                app: ctx.app_name.to_string(),
                env: ctx.env,
                source_key: secret.source.clone(),
            })?;
        data.insert(secret_data_key(secret), ByteString(value.as_bytes().to_vec()));
    }

    let labels = ctx.app_labels(
        replica_group.map(|group| (json2k8s_core::defaults::LABEL_REPLICA_GROUP, group)),
    );

    Ok(Secret {
        metadata: ctx.labeled_meta(naming::secret_manifest_name(resource), labels),
        type_: Some("Opaque".to_string()),
        data: Some(data),
        ..Default::default()
    })
}
