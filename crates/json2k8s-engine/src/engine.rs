//! Build orchestration

use std::collections::BTreeMap;

use json2k8s_core::{AppDescriptor, Environment, SecretMap, SecretSource};
use tracing::{debug, info};

use crate::context::{BuildContext, BuildOptions, BuildOptionsBuilder};
use crate::error::Result;
use crate::manifest::BuildOutput;
use crate::pipeline::{cronjob_pipeline, deployment_pipeline};

/// Turns validated descriptors into manifests
#[derive(Debug, Clone, Default)]
pub struct Engine {
    options: BuildOptions,
}

impl Engine {
    pub fn new(options: BuildOptions) -> Self {
        Self { options }
    }

    /// Builder for the engine's [`BuildOptions`]
    pub fn builder() -> BuildOptionsBuilder {
        BuildOptions::builder()
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Resolve the secret snapshot of every environment some descriptor uses
    ///
    /// Without a secrets directory every environment gets an empty mapping.
    fn resolve_secrets(
        &self,
        descriptors: &[AppDescriptor],
        source: &dyn SecretSource,
    ) -> Result<BTreeMap<Environment, SecretMap>> {
        let mut snapshots = BTreeMap::new();
        for env in Environment::ALL {
            if !descriptors.iter().any(|d| d.defines(env)) {
                debug!(env = %env, "no descriptor defines this environment, skipping secrets");
                continue;
            }
            let secrets = match &self.options.secrets_dir {
                Some(dir) => source.resolve(env, dir)?,
                None => SecretMap::new(),
            };
            debug!(env = %env, count = secrets.len(), "resolved secrets");
            snapshots.insert(env, secrets);
        }
        Ok(snapshots)
    }

    /// Build every environment of every descriptor
    ///
    /// Secrets are resolved once per environment before any manifest is
    /// built. The first failure aborts the build and no output is returned.
    pub fn build(
        &self,
        descriptors: &[AppDescriptor],
        source: &dyn SecretSource,
    ) -> Result<BuildOutput> {
        let snapshots = self.resolve_secrets(descriptors, source)?;
        let rollout_trigger = self.options.rollout_trigger_value();
        let empty = SecretMap::new();
        let mut output = BuildOutput::default();

        for descriptor in descriptors {
            for env in descriptor.environments() {
                let ctx = BuildContext {
                    app_name: descriptor.name(),
                    team: descriptor.team(),
                    env,
                    registry: &self.options.registry,
                    ingress_domain: &self.options.ingress_domain,
                    rollout_trigger: &rollout_trigger,
                    secrets: snapshots.get(&env).unwrap_or(&empty),
                };

                match descriptor {
                    AppDescriptor::Deployment(app) => {
                        if let Some(config) = app.environment(env) {
                            deployment_pipeline(&ctx, config, &mut output)?;
                        }
                    }
                    AppDescriptor::CronJob(app) => {
                        if let Some(config) = app.environment(env) {
                            cronjob_pipeline(&ctx, config, &mut output)?;
                        }
                    }
                }
            }
        }

        info!(
            descriptors = descriptors.len(),
            manifests = output.len(),
            "build complete"
        );
        Ok(output)
    }
}
