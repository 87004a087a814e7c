//! MCP service implementation using rmcp.
//!
//! This module defines the PgService struct with the PostgreSQL tools exposed
//! via the MCP protocol using the rmcp framework's macros. Tool failures are
//! reported inside the tool result (`isError: true`) rather than as protocol
//! errors.

use crate::config::Config;
use crate::db::{PgSource, QueryExecutor, SchemaAggregator};
use crate::tools::query::{QueryInput, QueryToolHandler};
use crate::tools::schema::{SchemaInfoInput, SchemaToolHandler};
use crate::tools::to_tool_result;
use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler,
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo},
    service::RequestContext,
    tool, tool_handler, tool_router,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct PgService {
    query_handler: Arc<QueryToolHandler<PgSource>>,
    schema_handler: Arc<SchemaToolHandler<PgSource>>,
    /// Tool router for MCP tool dispatch (auto-generated)
    tool_router: ToolRouter<Self>,
}

impl PgService {
    /// Create a new PgService over a connected source.
    pub fn new(source: PgSource, config: &Config) -> Self {
        let query_timeout = config.query_timeout_duration();
        let executor = QueryExecutor::with_timeout(source.clone(), query_timeout);
        let aggregator = SchemaAggregator::with_timeout(source, &config.schema, query_timeout);

        Self {
            query_handler: Arc::new(QueryToolHandler::new(executor)),
            schema_handler: Arc::new(SchemaToolHandler::new(aggregator)),
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router]
impl PgService {
    #[tool(
        description = "Execute a SQL query against the PostgreSQL database and return the rows as JSON.\nStatements containing DROP, TRUNCATE, DELETE, UPDATE, ALTER, CREATE or INSERT are refused unless `unsafe` is true."
    )]
    async fn pg_query(
        &self,
        Parameters(input): Parameters<QueryInput>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let outcome = self.query_handler.query(input, context.ct.cancelled()).await;
        Ok(to_tool_result(outcome))
    }

    #[tool(
        description = "Get table and column information for the configured schema.\nPass `table` to describe a single table; omit it to describe them all."
    )]
    async fn pg_schema_info(
        &self,
        Parameters(input): Parameters<SchemaInfoInput>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let outcome = self
            .schema_handler
            .schema_info(input, context.ct.cancelled())
            .await;
        Ok(to_tool_result(outcome))
    }
}

#[tool_handler]
impl ServerHandler for PgService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "postgres-mcp-server".to_owned(),
                title: Some("PostgreSQL MCP Server".to_owned()),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "PostgreSQL tools for running queries and inspecting table schemas.\n\
                \n\
                ## Tools\n\
                - `pg_query`: run SQL and get `{columns, rows, count}` back. A query that returns\n\
                  nothing yields `{message, columns}` instead.\n\
                - `pg_schema_info`: list tables with their columns, types, nullability, defaults\n\
                  and constraints. Pass `table` to describe one table.\n\
                \n\
                ## Safety\n\
                `pg_query` refuses statements containing DROP, TRUNCATE, DELETE, UPDATE, ALTER,\n\
                CREATE or INSERT. Set `unsafe: true` only when the change is intended."
                    .to_string(),
            ),
        }
    }
}
