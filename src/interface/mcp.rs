//! MCP Server for perpustakaan-console
//!
//! MCP Protocol (stdio) <-> application::ResourceListController (buku / kategori)
//!
//! 11 tools: list, form_open, form_set, form_submit, form_cancel,
//! delete_request, delete_confirm, delete_cancel, detail, detail_close, dashboard

use std::sync::Arc;

use rmcp::{
    handler::server::{tool::ToolCallContext, tool::ToolRouter, wrapper::Parameters},
    model::{
        CallToolRequestParams, CallToolResult, Content, Implementation, ListToolsResult,
        PaginatedRequestParams, ProtocolVersion, ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
    transport::stdio,
    ErrorData as McpError, ServerHandler, ServiceExt,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::application::controller::ResourceListController;
use crate::application::error::AppError;
use crate::application::notify::{Notification, NotificationLog, Notifier};
use crate::application::stats::{BookStats, CategoryStats};
use crate::application::view;
use crate::config::Config;
use crate::domain::model::book::Book;
use crate::domain::model::category::Category;
use crate::domain::model::id::ResourceId;
use crate::domain::model::resource::Resource;
use crate::domain::repository::ApiClient;
use crate::infra::http_client::HttpApiClient;

type Controller<R> = ResourceListController<R, HttpApiClient<R>, NotificationLog>;

// =============================================================================
// Public entry point
// =============================================================================

/// MCP Serverを起動する。起動時に両リソースの一覧を取得しておく。
pub async fn run(config: Config) -> anyhow::Result<()> {
    let server = ConsoleMcpServer::new(&config.api_url);
    server.activate().await;
    let service = server.serve(stdio()).await?;
    service.waiting().await?;
    Ok(())
}

// =============================================================================
// MCP Server
// =============================================================================

#[derive(Clone)]
struct ConsoleMcpServer {
    books: Arc<Mutex<Controller<Book>>>,
    categories: Arc<Mutex<Controller<Category>>>,
    book_notes: NotificationLog,
    category_notes: NotificationLog,
    tool_router: ToolRouter<Self>,
}

impl ConsoleMcpServer {
    fn new(api_url: &str) -> Self {
        let http = reqwest::Client::new();
        let book_notes = NotificationLog::new();
        let category_notes = NotificationLog::new();
        let books = ResourceListController::new(
            HttpApiClient::with_client(http.clone(), api_url),
            book_notes.clone(),
        );
        let categories = ResourceListController::new(
            HttpApiClient::with_client(http, api_url),
            category_notes.clone(),
        );
        Self {
            books: Arc::new(Mutex::new(books)),
            categories: Arc::new(Mutex::new(categories)),
            book_notes,
            category_notes,
            tool_router: Self::tool_router(),
        }
    }

    /// 初回取得。失敗しても起動は続ける（通知は最初のツール結果に載る）。
    async fn activate(&self) {
        if let Err(e) = self.books.lock().await.activate().await {
            tracing::warn!(error = %e, "initial book fetch failed");
        }
        if let Err(e) = self.categories.lock().await.activate().await {
            tracing::warn!(error = %e, "initial category fetch failed");
        }
    }

    fn notes(&self, kind: ResourceKind) -> &NotificationLog {
        match kind {
            ResourceKind::Buku => &self.book_notes,
            ResourceKind::Kategori => &self.category_notes,
        }
    }

    /// ツール結果に、対象リソースの通知を付けて返す。失敗通知があればエラー扱い。
    fn finish(&self, kind: ResourceKind, body: String) -> CallToolResult {
        let notes = self.notes(kind).drain();
        let failed = notes.iter().any(Notification::is_failure);
        let text = compose(&body, &notes);
        if failed {
            CallToolResult::error(vec![Content::text(text)])
        } else {
            CallToolResult::success(vec![Content::text(text)])
        }
    }
}

// =============================================================================
// ServerHandler impl
// =============================================================================

impl ServerHandler for ConsoleMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "perpustakaan-console".to_string(),
                title: Some("Perpustakaan Console: Buku & Kategori".to_string()),
                description: Some(
                    "Admin console for a library REST API. \
                     Every tool takes `resource`: 'buku' or 'kategori'."
                        .to_string(),
                ),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Manage books (buku) and categories (kategori).\n\
                 \n\
                 Create/edit: `form_open` (with id to edit) → `form_set` per field → `form_submit`. \
                 Delete: `delete_request` → `delete_confirm` or `delete_cancel`. \
                 `list` re-fetches from the server; `dashboard` shows stock stats."
                    .to_string(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult {
            tools: self.tool_router.list_all(),
            next_cursor: None,
            meta: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let tool_ctx = ToolCallContext::new(self, request, context);
        self.tool_router.call(tool_ctx).await
    }
}

// =============================================================================
// Request types
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResourceKind {
    Buku,
    Kategori,
}

fn parse_kind(s: &str) -> Result<ResourceKind, McpError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "buku" | "book" | "books" => Ok(ResourceKind::Buku),
        "kategori" | "category" | "categories" => Ok(ResourceKind::Kategori),
        other => Err(McpError::invalid_params(
            format!("Unknown resource: '{other}'. Use: buku, kategori"),
            None,
        )),
    }
}

fn parse_id(s: &str) -> Result<ResourceId, McpError> {
    s.parse::<ResourceId>()
        .map_err(|_| McpError::invalid_params(format!("Invalid id: '{s}'"), None))
}

fn to_mcp_error(e: AppError) -> McpError {
    match e {
        AppError::Domain(d) => McpError::invalid_params(d.to_string(), None),
        AppError::NoPendingDelete => McpError::invalid_params(
            "Nothing to confirm. Use `delete_request` first.",
            None,
        ),
        other => McpError::internal_error(other.to_string(), None),
    }
}

/// 本文と通知を1つのテキストにまとめる。
fn compose(body: &str, notes: &[Notification]) -> String {
    let mut text = body.to_string();
    for note in notes {
        let tag = if note.is_failure() { "gagal" } else { "ok" };
        if !text.is_empty() {
            text.push('\n');
        }
        text.push_str(&format!("[{tag}] {}", note.message()));
    }
    text
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct McpResourceRequest {
    #[schemars(description = "Resource type: 'buku' (books) or 'kategori' (categories)")]
    pub resource: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct McpFormOpenRequest {
    #[schemars(description = "Resource type: 'buku' or 'kategori'")]
    pub resource: String,
    #[schemars(description = "Record id to edit (from `list`). Omit to create a new record.")]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct McpFormSetRequest {
    #[schemars(description = "Resource type: 'buku' or 'kategori'")]
    pub resource: String,
    #[schemars(
        description = "Field name. buku: judul, penulis, penerbit, tahun_terbit, stok. kategori: nama"
    )]
    pub field: String,
    #[schemars(description = "Field value as typed (numbers are validated on submit)")]
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct McpRecordRequest {
    #[schemars(description = "Resource type: 'buku' or 'kategori'")]
    pub resource: String,
    #[schemars(description = "Record id from `list` output")]
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct McpDashboardRequest {}

// =============================================================================
// Per-resource operations (generic over the schema)
// =============================================================================

/// 一覧にあればそれを、無ければ再取得してから探す。
async fn find_record<R, C, N>(
    ctrl: &mut ResourceListController<R, C, N>,
    id: ResourceId,
) -> Result<R, McpError>
where
    R: Resource,
    C: ApiClient<R>,
    N: Notifier,
{
    if let Some(found) = ctrl.collection().get(id) {
        return Ok(found.clone());
    }
    let _ = ctrl.refresh().await;
    ctrl.collection().get(id).cloned().ok_or_else(|| {
        McpError::invalid_params(
            format!("No {} with id {id}. Run `list` to see available ids.", R::NOUN),
            None,
        )
    })
}

async fn list_op<R: Resource, C: ApiClient<R>>(
    ctrl: &mut ResourceListController<R, C, NotificationLog>,
) -> Result<String, McpError> {
    match ctrl.refresh().await {
        // 取得失敗時は前回の一覧をそのまま見せる
        Ok(_) | Err(AppError::FetchFailed(_)) => Ok(view::render_table(ctrl.collection())),
        Err(e) => Err(to_mcp_error(e)),
    }
}

async fn form_open_op<R: Resource, C: ApiClient<R>>(
    ctrl: &mut ResourceListController<R, C, NotificationLog>,
    id: Option<ResourceId>,
) -> Result<String, McpError> {
    match id {
        Some(id) => {
            let record = find_record(ctrl, id).await?;
            ctrl.begin_edit(&record);
        }
        None => ctrl.begin_create(),
    }
    Ok(view::render_draft::<R>(ctrl.draft(), ctrl.editing_id()))
}

fn form_set_op<R: Resource, C: ApiClient<R>>(
    ctrl: &mut ResourceListController<R, C, NotificationLog>,
    field: &str,
    value: String,
) -> Result<String, McpError> {
    if !ctrl.is_form_open() {
        return Err(McpError::invalid_params(
            "No form is open. Use `form_open` first.",
            None,
        ));
    }
    ctrl.update_draft_field(field, value).map_err(to_mcp_error)?;
    Ok(view::render_draft::<R>(ctrl.draft(), ctrl.editing_id()))
}

async fn form_submit_op<R: Resource, C: ApiClient<R>>(
    ctrl: &mut ResourceListController<R, C, NotificationLog>,
) -> Result<String, McpError> {
    if !ctrl.is_form_open() {
        return Err(McpError::invalid_params(
            "No form is open. Use `form_open` first.",
            None,
        ));
    }
    match ctrl.submit().await {
        Ok(saved) => {
            let head = match saved {
                Some(saved) => format!("Tersimpan: #{} {}", saved.id(), saved.label()),
                None => "Tersimpan.".to_string(),
            };
            Ok(format!("{head}\n\n{}", view::render_table(ctrl.collection())))
        }
        // フォームは保持されるので、そのまま再表示して再送信できるようにする
        Err(AppError::Domain(_)) | Err(AppError::MutationFailed { .. }) => {
            Ok(view::render_draft::<R>(ctrl.draft(), ctrl.editing_id()))
        }
        Err(e) => Err(to_mcp_error(e)),
    }
}

fn form_cancel_op<R: Resource, C: ApiClient<R>>(
    ctrl: &mut ResourceListController<R, C, NotificationLog>,
) -> String {
    ctrl.cancel_form();
    format!("Form {} ditutup.", R::NOUN)
}

async fn delete_request_op<R: Resource, C: ApiClient<R>>(
    ctrl: &mut ResourceListController<R, C, NotificationLog>,
    id: ResourceId,
) -> Result<String, McpError> {
    let record = find_record(ctrl, id).await?;
    ctrl.request_delete(&record);
    match ctrl.pending_delete() {
        Some(pending) => Ok(view::render_pending_delete::<R>(pending)),
        None => Err(McpError::internal_error("delete was not staged", None)),
    }
}

async fn delete_confirm_op<R: Resource, C: ApiClient<R>>(
    ctrl: &mut ResourceListController<R, C, NotificationLog>,
) -> Result<String, McpError> {
    match ctrl.confirm_delete().await {
        Ok(()) | Err(AppError::MutationFailed { .. }) => Ok(view::render_table(ctrl.collection())),
        Err(e) => Err(to_mcp_error(e)),
    }
}

fn delete_cancel_op<R: Resource, C: ApiClient<R>>(
    ctrl: &mut ResourceListController<R, C, NotificationLog>,
) -> String {
    ctrl.cancel_delete();
    format!("Penghapusan {} dibatalkan.", R::NOUN)
}

async fn detail_op<R: Resource, C: ApiClient<R>>(
    ctrl: &mut ResourceListController<R, C, NotificationLog>,
    id: ResourceId,
) -> Result<String, McpError> {
    let record = find_record(ctrl, id).await?;
    ctrl.view_detail(&record);
    Ok(ctrl
        .selected_for_detail()
        .map(view::render_detail)
        .unwrap_or_default())
}

fn detail_close_op<R: Resource, C: ApiClient<R>>(
    ctrl: &mut ResourceListController<R, C, NotificationLog>,
) -> String {
    ctrl.close_detail();
    format!("Detail {} ditutup.", R::NOUN)
}

// =============================================================================
// Tool implementations
// =============================================================================

#[tool_router]
impl ConsoleMcpServer {
    #[tool(
        name = "list",
        description = "Fetch the full list of books ('buku') or categories ('kategori') from the server and show it as a table with ids.",
        annotations(
            read_only_hint = true,
            destructive_hint = false,
            open_world_hint = true
        )
    )]
    async fn list(
        &self,
        Parameters(req): Parameters<McpResourceRequest>,
    ) -> Result<CallToolResult, McpError> {
        let kind = parse_kind(&req.resource)?;
        let body = match kind {
            ResourceKind::Buku => list_op(&mut *self.books.lock().await).await?,
            ResourceKind::Kategori => list_op(&mut *self.categories.lock().await).await?,
        };
        Ok(self.finish(kind, body))
    }

    #[tool(
        name = "form_open",
        description = "Open the create form, or the edit form when `id` is given (fields are pre-filled from the record).",
        annotations(
            read_only_hint = false,
            destructive_hint = false,
            idempotent_hint = true,
            open_world_hint = false
        )
    )]
    async fn form_open(
        &self,
        Parameters(req): Parameters<McpFormOpenRequest>,
    ) -> Result<CallToolResult, McpError> {
        let kind = parse_kind(&req.resource)?;
        let id = req.id.as_deref().map(parse_id).transpose()?;
        let body = match kind {
            ResourceKind::Buku => form_open_op(&mut *self.books.lock().await, id).await?,
            ResourceKind::Kategori => form_open_op(&mut *self.categories.lock().await, id).await?,
        };
        Ok(self.finish(kind, body))
    }

    #[tool(
        name = "form_set",
        description = "Set one field of the open form. Nothing is sent until `form_submit`.",
        annotations(
            read_only_hint = false,
            destructive_hint = false,
            idempotent_hint = true,
            open_world_hint = false
        )
    )]
    async fn form_set(
        &self,
        Parameters(req): Parameters<McpFormSetRequest>,
    ) -> Result<CallToolResult, McpError> {
        let kind = parse_kind(&req.resource)?;
        let body = match kind {
            ResourceKind::Buku => {
                form_set_op(&mut *self.books.lock().await, &req.field, req.value)?
            }
            ResourceKind::Kategori => {
                form_set_op(&mut *self.categories.lock().await, &req.field, req.value)?
            }
        };
        Ok(self.finish(kind, body))
    }

    #[tool(
        name = "form_submit",
        description = "Submit the open form: creates a new record, or updates the record being edited. The list is re-fetched afterwards. On failure the form is kept for retry.",
        annotations(
            read_only_hint = false,
            destructive_hint = false,
            idempotent_hint = false,
            open_world_hint = true
        )
    )]
    async fn form_submit(
        &self,
        Parameters(req): Parameters<McpResourceRequest>,
    ) -> Result<CallToolResult, McpError> {
        let kind = parse_kind(&req.resource)?;
        let body = match kind {
            ResourceKind::Buku => form_submit_op(&mut *self.books.lock().await).await?,
            ResourceKind::Kategori => form_submit_op(&mut *self.categories.lock().await).await?,
        };
        Ok(self.finish(kind, body))
    }

    #[tool(
        name = "form_cancel",
        description = "Discard the form input and close the form.",
        annotations(
            read_only_hint = false,
            destructive_hint = false,
            idempotent_hint = true,
            open_world_hint = false
        )
    )]
    async fn form_cancel(
        &self,
        Parameters(req): Parameters<McpResourceRequest>,
    ) -> Result<CallToolResult, McpError> {
        let kind = parse_kind(&req.resource)?;
        let body = match kind {
            ResourceKind::Buku => form_cancel_op(&mut *self.books.lock().await),
            ResourceKind::Kategori => form_cancel_op(&mut *self.categories.lock().await),
        };
        Ok(self.finish(kind, body))
    }

    #[tool(
        name = "delete_request",
        description = "Stage a record for deletion. Nothing is deleted until `delete_confirm`.",
        annotations(
            read_only_hint = false,
            destructive_hint = false,
            idempotent_hint = true,
            open_world_hint = false
        )
    )]
    async fn delete_request(
        &self,
        Parameters(req): Parameters<McpRecordRequest>,
    ) -> Result<CallToolResult, McpError> {
        let kind = parse_kind(&req.resource)?;
        let id = parse_id(&req.id)?;
        let body = match kind {
            ResourceKind::Buku => delete_request_op(&mut *self.books.lock().await, id).await?,
            ResourceKind::Kategori => {
                delete_request_op(&mut *self.categories.lock().await, id).await?
            }
        };
        Ok(self.finish(kind, body))
    }

    #[tool(
        name = "delete_confirm",
        description = "Delete the record staged by `delete_request`, then re-fetch the list.",
        annotations(
            read_only_hint = false,
            destructive_hint = true,
            idempotent_hint = false,
            open_world_hint = true
        )
    )]
    async fn delete_confirm(
        &self,
        Parameters(req): Parameters<McpResourceRequest>,
    ) -> Result<CallToolResult, McpError> {
        let kind = parse_kind(&req.resource)?;
        let body = match kind {
            ResourceKind::Buku => delete_confirm_op(&mut *self.books.lock().await).await?,
            ResourceKind::Kategori => {
                delete_confirm_op(&mut *self.categories.lock().await).await?
            }
        };
        Ok(self.finish(kind, body))
    }

    #[tool(
        name = "delete_cancel",
        description = "Drop the staged deletion without contacting the server.",
        annotations(
            read_only_hint = false,
            destructive_hint = false,
            idempotent_hint = true,
            open_world_hint = false
        )
    )]
    async fn delete_cancel(
        &self,
        Parameters(req): Parameters<McpResourceRequest>,
    ) -> Result<CallToolResult, McpError> {
        let kind = parse_kind(&req.resource)?;
        let body = match kind {
            ResourceKind::Buku => delete_cancel_op(&mut *self.books.lock().await),
            ResourceKind::Kategori => delete_cancel_op(&mut *self.categories.lock().await),
        };
        Ok(self.finish(kind, body))
    }

    #[tool(
        name = "detail",
        description = "Show all fields of one record (read-only).",
        annotations(
            read_only_hint = true,
            destructive_hint = false,
            open_world_hint = false
        )
    )]
    async fn detail(
        &self,
        Parameters(req): Parameters<McpRecordRequest>,
    ) -> Result<CallToolResult, McpError> {
        let kind = parse_kind(&req.resource)?;
        let id = parse_id(&req.id)?;
        let body = match kind {
            ResourceKind::Buku => detail_op(&mut *self.books.lock().await, id).await?,
            ResourceKind::Kategori => detail_op(&mut *self.categories.lock().await, id).await?,
        };
        Ok(self.finish(kind, body))
    }

    #[tool(
        name = "detail_close",
        description = "Close the detail view.",
        annotations(
            read_only_hint = false,
            destructive_hint = false,
            idempotent_hint = true,
            open_world_hint = false
        )
    )]
    async fn detail_close(
        &self,
        Parameters(req): Parameters<McpResourceRequest>,
    ) -> Result<CallToolResult, McpError> {
        let kind = parse_kind(&req.resource)?;
        let body = match kind {
            ResourceKind::Buku => detail_close_op(&mut *self.books.lock().await),
            ResourceKind::Kategori => detail_close_op(&mut *self.categories.lock().await),
        };
        Ok(self.finish(kind, body))
    }

    #[tool(
        name = "dashboard",
        description = "Show totals from the last fetched lists: books, available stock, out-of-stock books, categories.",
        annotations(
            read_only_hint = true,
            destructive_hint = false,
            open_world_hint = false
        )
    )]
    async fn dashboard(
        &self,
        Parameters(_req): Parameters<McpDashboardRequest>,
    ) -> Result<CallToolResult, McpError> {
        let book_stats = BookStats::of(self.books.lock().await.collection());
        let category_stats = CategoryStats::of(self.categories.lock().await.collection());
        let body = view::render_dashboard(&book_stats, &category_stats);
        Ok(CallToolResult::success(vec![Content::text(body)]))
    }
}
