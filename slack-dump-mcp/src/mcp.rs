use std::future::Future;
use std::sync::Arc;

use log::{error, info};
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, LoggingLevel, ServerCapabilities, ServerInfo,
    SetLevelRequestParam,
};
use rmcp::schemars;
use rmcp::service::RequestContext;
use rmcp::{ErrorData, RoleServer, ServerHandler, ServiceExt, tool, tool_handler, tool_router};
use serde::Deserialize;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::api::slackdump::CommandRunner;
use crate::cli::LogLevel;
use crate::services::Dumper;

pub const SERVER_NAME: &str = "Dump Slack Threads";

#[derive(Debug, Clone, Deserialize, schemars::JsonSchema)]
pub struct DumpThreadParams {
    #[schemars(
        description = "The URL of the Slack thread to dump. for example: https://slack.com/archives/C0123456789/p1234567890"
    )]
    pub url: String,
}

/// MCP server exposing `dump_slack_thread`.
#[derive(Clone)]
pub struct SlackDumpServer {
    dumper: Arc<Dumper<Box<dyn CommandRunner>>>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl SlackDumpServer {
    pub fn new(dumper: Dumper<Box<dyn CommandRunner>>) -> Self {
        Self {
            dumper: Arc::new(dumper),
            tool_router: Self::tool_router(),
        }
    }

    pub async fn serve_stdio(self) -> Result<(), rmcp::RmcpError> {
        self.serve_io(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Serves one MCP session until the peer disconnects.
    pub async fn serve_io<I, O>(self, input: I, output: O) -> Result<(), rmcp::RmcpError>
    where
        I: AsyncRead + Send + Unpin + 'static,
        O: AsyncWrite + Send + Unpin + 'static,
    {
        info!("{SERVER_NAME} listening");
        let service = self.serve((input, output)).await?;
        service.waiting().await?;
        Ok(())
    }

    /// The URL shape is not checked here, slackdump rejects bad ones.
    #[tool(name = "dump_slack_thread", description = "Dump a Slack Thread")]
    pub async fn dump_slack_thread(
        &self,
        Parameters(params): Parameters<DumpThreadParams>,
    ) -> Result<CallToolResult, ErrorData> {
        if params.url.trim().is_empty() {
            return Err(ErrorData::invalid_params("`url` must not be empty", None));
        }

        match self.dumper.dump(&params.url).await {
            Ok(lines) => Ok(CallToolResult::success(vec![Content::text(
                lines.join("\n"),
            )])),
            Err(e) => {
                error!("dump_slack_thread failed for {}: {}", params.url, e);
                Err(ErrorData::internal_error(e.to_string(), None))
            }
        }
    }
}

/// Applies an MCP `logging/setLevel` request to the process logger.
pub fn apply_log_level(level: LoggingLevel) {
    let level = LogLevel::from(level);
    log::set_max_level(level.into());
    info!("log level set to {level}");
}

#[tool_handler]
impl ServerHandler for SlackDumpServer {
    fn get_info(&self) -> ServerInfo {
        let mut server_info = Implementation::from_build_env();
        server_info.name = SERVER_NAME.to_string();
        server_info.version = env!("CARGO_PKG_VERSION").to_string();

        ServerInfo {
            instructions: Some(
                "Dumps a Slack thread through slackdump as `sender: text` lines (tools: dump_slack_thread)"
                    .into(),
            ),
            capabilities: ServerCapabilities::builder()
                .enable_logging()
                .enable_tools()
                .build(),
            server_info,
            ..Default::default()
        }
    }

    fn set_level(
        &self,
        request: SetLevelRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<(), ErrorData>> + Send + '_ {
        apply_log_level(request.level);
        std::future::ready(Ok(()))
    }
}
