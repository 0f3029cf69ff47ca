use std::sync::Arc;

use crate::config::Settings;
use crate::constants::doh as doh_constants;
use crate::errors::ToolError;
use crate::mcp::server::McpServer;
use crate::openapi::{default_exclusions, generate_tools, OpenApiDocument};
use crate::services::access_transport::AccessControlledTransport;
use crate::services::bulk::{BulkReplaceTool, BULK_LISTS};
use crate::services::doh::{self, DohLookupTool};
use crate::services::logger::Logger;
use crate::services::policy::{AccessPolicy, AccessPolicyConfig, PolicyHandle};
use crate::services::tool_executor::{ToolExecutor, ToolRegistry};
use crate::services::transport::{HttpTransport, ReqwestTransport};

pub struct App {
    pub logger: Logger,
    pub policy: PolicyHandle,
    pub tool_executor: Arc<ToolExecutor>,
}

impl App {
    pub fn initialize(settings: &Settings) -> Result<Self, ToolError> {
        let api = ReqwestTransport::new(&settings.base_url, &settings.api_key, settings.http_timeout)?;
        let resolver = ReqwestTransport::doh(doh_constants::BASE_URL, settings.http_timeout)?;
        Self::with_transports(settings, Arc::new(api), Arc::new(resolver))
    }

    /// Wires the tool set on top of the given transports. `api` is wrapped in
    /// the access check; `resolver` is used as is by `dohLookup`.
    pub fn with_transports(
        settings: &Settings,
        api: Arc<dyn HttpTransport>,
        resolver: Arc<dyn HttpTransport>,
    ) -> Result<Self, ToolError> {
        let logger = Logger::new("nextdns");

        let policy = AccessPolicy::new(settings.access.clone());
        policy.log_summary(&logger.child("access"));
        let policy = PolicyHandle::new(policy);

        let guarded: Arc<dyn HttpTransport> = Arc::new(AccessControlledTransport::new(
            api,
            policy.clone(),
            logger.clone(),
        ));

        let document = OpenApiDocument::load(settings.openapi_path.as_deref())?;
        let exclusions = default_exclusions()?;

        let mut registry = ToolRegistry::new();
        for (def, tool) in generate_tools(&document, guarded.clone(), &exclusions, &logger)? {
            registry.register(def, Arc::new(tool))?;
        }
        let generated = registry.len();

        for spec in BULK_LISTS {
            registry.register(
                spec.tool_def(),
                Arc::new(BulkReplaceTool::new(spec, guarded.clone(), logger.clone())),
            )?;
        }
        registry.register(
            doh::tool_def(),
            Arc::new(DohLookupTool::new(
                resolver,
                settings.default_profile.clone(),
                logger.clone(),
            )),
        )?;

        logger.info(
            &format!(
                "Registered {} tools ({} generated, {} bulk, 1 DoH)",
                registry.len(),
                generated,
                BULK_LISTS.len()
            ),
            None,
        );

        let tool_executor = Arc::new(ToolExecutor::new(logger.clone(), registry));
        Ok(Self {
            logger,
            policy,
            tool_executor,
        })
    }

    pub fn mcp_server(&self) -> McpServer {
        McpServer::new(self.tool_executor.clone(), self.logger.clone())
    }

    /// Swaps in a policy built from `config`. Requests already past the check
    /// keep the previous snapshot.
    pub fn reload_access_policy(&self, config: AccessPolicyConfig) {
        let policy = AccessPolicy::new(config);
        policy.log_summary(&self.logger.child("access"));
        self.policy.replace(policy);
        self.logger.info("Access policy reloaded", None);
    }
}
