//! Persistent volume claims

use std::collections::BTreeMap;

use json2k8s_core::{PersistentVolume, defaults, naming};
use k8s_openapi::api::core::v1::{
    PersistentVolumeClaim, PersistentVolumeClaimSpec, VolumeResourceRequirements,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;

use crate::context::BuildContext;

/// Claim `<group>-<volume>` backing one persistent volume of a replica group
pub fn build_pvc(
    ctx: &BuildContext<'_>,
    group: &str,
    volume: &PersistentVolume,
) -> PersistentVolumeClaim {
    let labels = ctx.app_labels([(defaults::LABEL_REPLICA_GROUP, group)]);

    PersistentVolumeClaim {
        metadata: ctx.labeled_meta(naming::pvc_name(group, &volume.name), labels),
        spec: Some(PersistentVolumeClaimSpec {
            access_modes: Some(vec![volume.access_mode.as_str().to_string()]),
            resources: Some(VolumeResourceRequirements {
                requests: Some(BTreeMap::from([(
                    "storage".to_string(),
                    Quantity(volume.size.clone()),
                )])),
                limits: None,
            }),
            storage_class_name: volume.storage_class.clone(),
            ..Default::default()
        }),
        ..Default::default()
    }
}
