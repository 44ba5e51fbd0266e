//! The invoice list view engine.
//!
//! The source collection never changes. What the user sees is a projection
//! computed in a fixed order:
//!
//! 1. status filter,
//! 2. fuzzy search over a lowercase blob of number, client, customer and
//!    amount,
//! 3. stable sort by the active column.
//!
//! The projection is cached and rebuilt on the first read after any input
//! changes. Selection and expansion are id sets kept apart from it, so they
//! survive re-filtering and re-sorting.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::bulk::{BulkAction, BulkActionHandler};
use crate::bus::{EventBus, Subscription, Topic};
use crate::error::ListViewError;
use crate::export::{CsvValue, to_csv};
use crate::invoice::{FtaStatus, Invoice, RowStatus, parse_amount};

// ── Columns ──────────────────────────────────────────────────────────

/// A column of the invoice table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Column {
    InvoiceNumber,
    Client,
    Amount,
    InvoiceDate,
    Status,
    FtaStatus,
    ValidationScore,
    Items,
    Actions,
}

/// How a column orders its values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKind {
    /// Lexicographic over the displayed string.
    Text,
    Numeric,
    Unsortable,
}

impl Column {
    pub fn sort_kind(self) -> SortKind {
        match self {
            Self::InvoiceNumber | Self::Client | Self::Amount | Self::InvoiceDate => SortKind::Text,
            Self::ValidationScore | Self::Items => SortKind::Numeric,
            Self::Status | Self::FtaStatus | Self::Actions => SortKind::Unsortable,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvoiceNumber => "invoiceNumber",
            Self::Client => "client",
            Self::Amount => "amount",
            Self::InvoiceDate => "invoiceDate",
            Self::Status => "status",
            Self::FtaStatus => "ftaStatus",
            Self::ValidationScore => "validationScore",
            Self::Items => "items",
            Self::Actions => "actions",
        }
    }

    fn compare(self, a: &Invoice, b: &Invoice) -> Ordering {
        match self {
            Self::InvoiceNumber => a.invoice_number.cmp(&b.invoice_number),
            Self::Client => a.client.cmp(&b.client),
            Self::Amount => a.amount.cmp(&b.amount),
            Self::InvoiceDate => a.invoice_date.cmp(&b.invoice_date),
            Self::ValidationScore => a.validation_score.cmp(&b.validation_score),
            Self::Items => a.items.cmp(&b.items),
            Self::Status | Self::FtaStatus | Self::Actions => Ordering::Equal,
        }
    }

    fn csv_value(self, invoice: &Invoice) -> CsvValue {
        match self {
            Self::InvoiceNumber => CsvValue::Text(invoice.invoice_number.clone()),
            Self::Client => CsvValue::Text(invoice.client.clone()),
            Self::Amount => CsvValue::Text(invoice.amount.clone()),
            Self::InvoiceDate => CsvValue::Text(invoice.invoice_date.clone()),
            Self::Status => CsvValue::Text(invoice.status.as_str().to_owned()),
            Self::FtaStatus => CsvValue::Text(invoice.fta_status.as_str().to_owned()),
            Self::ValidationScore => CsvValue::Number(f64::from(invoice.validation_score)),
            Self::Items => invoice
                .items
                .map_or(CsvValue::Empty, |n| CsvValue::Number(f64::from(n))),
            Self::Actions => CsvValue::Empty,
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColumnDef {
    pub column: Column,
    pub header: &'static str,
    pub sortable: bool,
}

const fn def(column: Column, header: &'static str, sortable: bool) -> ColumnDef {
    ColumnDef {
        column,
        header,
        sortable,
    }
}

/// The table's columns, in display order.
pub const TABLE_COLUMNS: [ColumnDef; 7] = [
    def(Column::InvoiceNumber, "Invoice #", true),
    def(Column::Client, "Client", true),
    def(Column::Amount, "Amount", true),
    def(Column::InvoiceDate, "Date", true),
    def(Column::Status, "Status", false),
    def(Column::FtaStatus, "FTA Status", false),
    def(Column::Actions, "Actions", false),
];

// ── Query ────────────────────────────────────────────────────────────

/// `all`, or a single row status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum StatusFilter {
    #[default]
    All,
    Only(RowStatus),
}

impl StatusFilter {
    fn keeps(self, invoice: &Invoice) -> bool {
        match self {
            Self::All => true,
            Self::Only(status) => invoice.status == status,
        }
    }
}

impl TryFrom<String> for StatusFilter {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value == "all" {
            return Ok(Self::All);
        }
        RowStatus::parse(&value)
            .map(Self::Only)
            .ok_or_else(|| format!("unknown status filter '{value}'"))
    }
}

impl From<StatusFilter> for String {
    fn from(filter: StatusFilter) -> Self {
        match filter {
            StatusFilter::All => "all".to_owned(),
            StatusFilter::Only(status) => status.as_str().to_owned(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

impl SortDir {
    fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Table,
    Kanban,
    Analytics,
}

/// The inputs of the projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub search: String,
    pub status: StatusFilter,
    pub sort_by: Option<Column>,
    pub sort_dir: SortDir,
}

impl Default for ListQuery {
    /// Newest first.
    fn default() -> Self {
        Self {
            search: String::new(),
            status: StatusFilter::All,
            sort_by: Some(Column::InvoiceDate),
            sort_dir: SortDir::Desc,
        }
    }
}

// ── Derived views ────────────────────────────────────────────────────

/// Totals over the whole collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceStats {
    pub total_invoices: usize,
    pub approved: usize,
    pub pending: usize,
    pub rejected: usize,
    pub validated: usize,
    pub total_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KanbanColumn<'a> {
    pub status: RowStatus,
    pub invoices: Vec<&'a Invoice>,
}

/// Column order of the kanban board.
pub const KANBAN_ORDER: [RowStatus; 4] = [
    RowStatus::Validated,
    RowStatus::Sent,
    RowStatus::Pending,
    RowStatus::Rejected,
];

/// The rows a virtual scroller should render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibleWindow {
    pub start: usize,
    /// Exclusive.
    pub end: usize,
    pub offset_y: usize,
    pub total_height: usize,
}

/// Rows `start..end` of `len` cover the viewport plus one row of overscan.
pub fn virtual_window(
    len: usize,
    scroll_top: usize,
    container_height: usize,
    item_height: usize,
) -> VisibleWindow {
    if item_height == 0 {
        return VisibleWindow {
            start: 0,
            end: 0,
            offset_y: 0,
            total_height: 0,
        };
    }
    let start = (scroll_top / item_height).min(len);
    let end = scroll_top
        .saturating_add(container_height)
        .div_ceil(item_height)
        .saturating_add(1)
        .min(len)
        .max(start);
    VisibleWindow {
        start,
        end,
        offset_y: start.saturating_mul(item_height),
        total_height: len.saturating_mul(item_height),
    }
}

/// Serializable state of the list view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSnapshot {
    pub query: ListQuery,
    pub view_mode: ViewMode,
    pub columns: Vec<ColumnDef>,
    pub total: usize,
    pub rows: Vec<Invoice>,
    pub selected: Vec<String>,
    pub expanded: Vec<String>,
}

/// Case-insensitive ordered-subsequence test: every character of `query`
/// appears in `text`, in order, not necessarily adjacent.
pub fn fuzzy_match(text: &str, query: &str) -> bool {
    is_subsequence(&text.to_lowercase(), &query.to_lowercase())
}

fn is_subsequence(hay: &str, needle: &str) -> bool {
    let mut wanted = needle.chars().peekable();
    for c in hay.chars() {
        if wanted.peek() == Some(&c) {
            wanted.next();
        }
    }
    wanted.peek().is_none()
}

fn haystack(invoice: &Invoice) -> String {
    format!(
        "{} {} {} {}",
        invoice.invoice_number, invoice.client, invoice.customer_name, invoice.amount
    )
    .to_lowercase()
}

// ── List view ────────────────────────────────────────────────────────

pub struct ListView {
    rows: Arc<[Invoice]>,
    haystacks: Vec<String>,
    query: ListQuery,
    selected: BTreeSet<String>,
    expanded: BTreeSet<String>,
    view_mode: ViewMode,
    projection: Option<Vec<usize>>,
    focus: Option<Subscription>,
}

impl fmt::Debug for ListView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListView")
            .field("rows", &self.rows.len())
            .field("query", &self.query)
            .field("selected", &self.selected)
            .field("view_mode", &self.view_mode)
            .finish_non_exhaustive()
    }
}

impl ListView {
    #[must_use]
    pub fn new(rows: Arc<[Invoice]>) -> Self {
        let haystacks = rows.iter().map(haystack).collect();
        Self {
            rows,
            haystacks,
            query: ListQuery::default(),
            selected: BTreeSet::new(),
            expanded: BTreeSet::new(),
            view_mode: ViewMode::default(),
            projection: None,
            focus: None,
        }
    }

    /// Listen for `focus-search` requests on `bus`.
    #[must_use]
    pub fn with_focus_events(mut self, bus: &EventBus) -> Self {
        self.focus = Some(bus.subscribe(Topic::FocusSearch));
        self
    }

    pub fn query(&self) -> &ListQuery {
        &self.query
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn rows(&self) -> &[Invoice] {
        &self.rows
    }

    pub fn selected(&self) -> &BTreeSet<String> {
        &self.selected
    }

    pub fn expanded(&self) -> &BTreeSet<String> {
        &self.expanded
    }

    /// The visible rows, in display order.
    pub fn projection(&mut self) -> Vec<&Invoice> {
        self.refresh();
        let rows = &self.rows;
        self.projection
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter_map(|&i| rows.get(i))
            .collect()
    }

    pub fn set_search(&mut self, search: &str) {
        if self.query.search != search {
            self.query.search = search.to_owned();
            self.invalidate();
        }
    }

    pub fn set_status_filter(&mut self, status: StatusFilter) {
        if self.query.status != status {
            self.query.status = status;
            self.invalidate();
        }
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        self.view_mode = mode;
    }

    /// Header click. The active column flips direction; another column
    /// becomes active, ascending.
    ///
    /// # Errors
    ///
    /// Returns [`ListViewError::UnsortableColumn`] for status and action
    /// columns.
    pub fn sort_by(&mut self, column: Column) -> Result<SortDir, ListViewError> {
        if column.sort_kind() == SortKind::Unsortable {
            return Err(ListViewError::UnsortableColumn {
                column: column.to_string(),
            });
        }
        if self.query.sort_by == Some(column) {
            self.query.sort_dir = self.query.sort_dir.flipped();
        } else {
            self.query.sort_by = Some(column);
            self.query.sort_dir = SortDir::Asc;
        }
        self.invalidate();
        Ok(self.query.sort_dir)
    }

    /// Flip one invoice's selection. Returns whether it is now selected.
    ///
    /// # Errors
    ///
    /// Returns [`ListViewError::UnknownInvoice`] if no invoice has `id`.
    pub fn toggle_one(&mut self, id: &str) -> Result<bool, ListViewError> {
        self.ensure_known(id)?;
        Ok(flip(&mut self.selected, id))
    }

    /// Select-all checkbox: clear the whole selection when it already holds
    /// every row of the non-empty filtered set, otherwise select exactly the
    /// filtered set. Returns the number now selected.
    pub fn toggle_all(&mut self) -> usize {
        let visible: BTreeSet<String> = self.projection().iter().map(|i| i.id.clone()).collect();
        if !visible.is_empty() && visible.is_subset(&self.selected) {
            self.selected.clear();
        } else {
            self.selected = visible;
        }
        self.selected.len()
    }

    /// Expand or collapse a row's detail panel. Returns whether it is now
    /// expanded.
    ///
    /// # Errors
    ///
    /// Returns [`ListViewError::UnknownInvoice`] if no invoice has `id`.
    pub fn toggle_expand(&mut self, id: &str) -> Result<bool, ListViewError> {
        self.ensure_known(id)?;
        Ok(flip(&mut self.expanded, id))
    }

    /// Hand the selection to `handler`, then clear it.
    ///
    /// Returns the ids the action was applied to.
    ///
    /// # Errors
    ///
    /// - [`ListViewError::EmptySelection`] if nothing is selected.
    /// - [`ListViewError::BulkAction`] if the handler fails; the selection
    ///   is kept.
    pub async fn apply_bulk(
        &mut self,
        action: BulkAction,
        handler: &dyn BulkActionHandler,
    ) -> Result<Vec<String>, ListViewError> {
        if self.selected.is_empty() {
            return Err(ListViewError::EmptySelection);
        }
        let ids: Vec<String> = self.selected.iter().cloned().collect();
        handler.apply(&ids, action).await?;
        self.selected.clear();
        info!(%action, count = ids.len(), "bulk action applied");
        Ok(ids)
    }

    /// The projection as CSV under the table headers.
    pub fn export_csv(&mut self) -> String {
        let headers: Vec<&str> = TABLE_COLUMNS.iter().map(|c| c.header).collect();
        let rows: Vec<Vec<CsvValue>> = self
            .projection()
            .into_iter()
            .map(|invoice| {
                TABLE_COLUMNS
                    .iter()
                    .map(|c| c.column.csv_value(invoice))
                    .collect()
            })
            .collect();
        to_csv(&headers, rows)
    }

    /// Counts by FTA status and the summed amount, over every invoice.
    pub fn stats(&self) -> InvoiceStats {
        let count = |status: FtaStatus| self.rows.iter().filter(|i| i.fta_status == status).count();
        InvoiceStats {
            total_invoices: self.rows.len(),
            approved: count(FtaStatus::Approved),
            pending: count(FtaStatus::Pending),
            rejected: count(FtaStatus::Rejected),
            validated: count(FtaStatus::Validated),
            total_amount: self.rows.iter().map(|i| parse_amount(&i.amount)).sum(),
        }
    }

    /// The projection grouped by row status.
    pub fn kanban(&mut self) -> Vec<KanbanColumn<'_>> {
        let visible = self.projection();
        KANBAN_ORDER
            .into_iter()
            .map(|status| KanbanColumn {
                status,
                invoices: visible.iter().copied().filter(|i| i.status == status).collect(),
            })
            .collect()
    }

    /// Virtual-scroll slice of the projection.
    pub fn visible_window(
        &mut self,
        scroll_top: usize,
        container_height: usize,
        item_height: usize,
    ) -> VisibleWindow {
        let len = self.projection().len();
        virtual_window(len, scroll_top, container_height, item_height)
    }

    /// Whether a `focus-search` request arrived since the last call.
    pub fn take_focus_request(&mut self) -> bool {
        self.focus
            .as_mut()
            .is_some_and(|sub| !sub.drain().is_empty())
    }

    pub fn snapshot(&mut self) -> ListSnapshot {
        let rows = self.projection().into_iter().cloned().collect();
        ListSnapshot {
            query: self.query.clone(),
            view_mode: self.view_mode,
            columns: TABLE_COLUMNS.to_vec(),
            total: self.rows.len(),
            rows,
            selected: self.selected.iter().cloned().collect(),
            expanded: self.expanded.iter().cloned().collect(),
        }
    }

    fn ensure_known(&self, id: &str) -> Result<(), ListViewError> {
        if self.rows.iter().any(|i| i.id == id) {
            Ok(())
        } else {
            Err(ListViewError::UnknownInvoice { id: id.to_owned() })
        }
    }

    fn invalidate(&mut self) {
        self.projection = None;
    }

    fn refresh(&mut self) {
        if self.projection.is_some() {
            return;
        }
        let needle = self.query.search.to_lowercase();
        let status = self.query.status;
        let mut indices: Vec<usize> = (0..self.rows.len())
            .filter(|&i| status.keeps(&self.rows[i]))
            .filter(|&i| is_subsequence(&self.haystacks[i], &needle))
            .collect();

        if let Some(column) = self.query.sort_by {
            let desc = self.query.sort_dir == SortDir::Desc;
            let rows = &self.rows;
            indices.sort_by(|&a, &b| {
                let ord = column.compare(&rows[a], &rows[b]);
                if desc { ord.reverse() } else { ord }
            });
        }

        debug!(
            search = %self.query.search,
            status = %String::from(status),
            sort_by = ?self.query.sort_by,
            visible = indices.len(),
            "projection recomputed"
        );
        self.projection = Some(indices);
    }
}

fn flip(set: &mut BTreeSet<String>, id: &str) -> bool {
    if set.remove(id) {
        false
    } else {
        set.insert(id.to_owned());
        true
    }
}
