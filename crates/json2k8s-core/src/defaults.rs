//! Generation defaults shared by every manifest builder
//!
//! Anything that more than one builder has to agree on lives here, so the
//! cross-references between generated objects can be audited in one place.

/// Registry prefix for images synthesized from `imageTag`
pub const IMAGE_REGISTRY: &str = "us-central1-docker.pkg.dev/mrgn-shared/shared-artifact-registry";

/// Base domain for ingress hosts
pub const INGRESS_DOMAIN: &str = "mrgn.app";

/// Namespace every object is generated into
pub const NAMESPACE: &str = "default";

/// Pull policy for every container
pub const IMAGE_PULL_POLICY: &str = "Always";

// =============================================================================
// LABELS & ANNOTATIONS
// =============================================================================

pub const LABEL_APP: &str = "app";
pub const LABEL_REPLICA_GROUP: &str = "replicaGroup";
pub const LABEL_TEAM: &str = "team";

/// Pod annotation rewritten on every build to force a rolling restart
pub const ROLLOUT_TRIGGER_ANNOTATION: &str = "rollout-trigger";

/// Metrics scraping annotations added to every pod template
pub const METRICS_ANNOTATIONS: [(&str, &str); 3] = [
    ("prometheus.io/scrape", "true"),
    ("prometheus.io/port", "9000"),
    ("prometheus.io/path", "/metrics"),
];

// =============================================================================
// SCHEDULING
// =============================================================================

/// Taint key matched by the workflow toleration
pub const TOLERATION_KEY: &str = "workload-type";
pub const TOLERATION_OPERATOR: &str = "Equal";
pub const TOLERATION_EFFECT: &str = "NoSchedule";

/// Node label selected by the workflow tag
pub const NODE_POOL_SELECTOR: &str = "node-pool";

pub const DEPLOYMENT_RESTART_POLICY: &str = "Always";
pub const CRONJOB_RESTART_POLICY: &str = "OnFailure";

// =============================================================================
// DEPLOYMENTS
// =============================================================================

pub const ROLLING_UPDATE_MAX_SURGE: &str = "25%";
pub const ROLLING_UPDATE_MAX_UNAVAILABLE: i32 = 0;

/// Sidecar resources when the descriptor sets none: (cpu, memory)
pub const SIDECAR_REQUESTS: (&str, &str) = ("100m", "128Mi");
pub const SIDECAR_LIMITS: (&str, &str) = ("200m", "256Mi");

pub const SERVICE_TYPE: &str = "ClusterIP";

// =============================================================================
// INGRESS
// =============================================================================

pub const INGRESS_CLASS_ANNOTATION: (&str, &str) = ("kubernetes.io/ingress.class", "nginx");
pub const CLUSTER_ISSUER_ANNOTATION: (&str, &str) =
    ("cert-manager.io/cluster-issuer", "letsencrypt-prod");
pub const REWRITE_TARGET_ANNOTATION: (&str, &str) =
    ("nginx.ingress.kubernetes.io/rewrite-target", "/$2");

// =============================================================================
// CRONJOBS
// =============================================================================

pub const SUCCESSFUL_JOBS_HISTORY_LIMIT: i32 = 3;
pub const FAILED_JOBS_HISTORY_LIMIT: i32 = 1;
pub const BACKOFF_LIMIT: i32 = 1;
/// Two days
pub const TTL_SECONDS_AFTER_FINISHED: i32 = 172_800;
pub const SUSPEND: bool = false;
