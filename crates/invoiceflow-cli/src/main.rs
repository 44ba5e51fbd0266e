//! `InvoiceFlow` CLI: a terminal front end for one dashboard tab.
//!
//! Talks to the `InvoiceFlow` server over its JSON API only. Open a tab with
//! `invoiceflow open`, export the printed id as `INVOICEFLOW_TAB`, then drive
//! the tab with the other commands.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde_json::{Value, json};

// ── ANSI color helpers ───────────────────────────────────────────────

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const WHITE: &str = "\x1b[37m";

const PAGES: [&str; 5] = ["dashboard", "invoices", "clients", "reports", "settings"];

// ── CLI structure ────────────────────────────────────────────────────

/// `InvoiceFlow`: UAE e-invoicing compliance dashboard.
#[derive(Parser)]
#[command(
    name = "invoiceflow",
    version,
    about = "InvoiceFlow CLI: sign in, browse the dashboard and work the invoice list",
    long_about = None,
    after_help = format!(
        "{DIM}Environment variables:{RESET}\n  \
         INVOICEFLOW_ADDR   Server address (default: http://127.0.0.1:8300)\n  \
         INVOICEFLOW_TAB    Tab id from `invoiceflow open`\n\n\
         {DIM}Examples:{RESET}\n  \
         export INVOICEFLOW_TAB=$(invoiceflow open --quiet)\n  \
         invoiceflow nav login\n  \
         invoiceflow login --email a@gmail.com --password 'Asdf@1234'\n  \
         invoiceflow invoices list --status pending\n  \
         invoiceflow invoices export --output invoices.csv"
    ),
)]
struct Cli {
    /// `InvoiceFlow` server address.
    #[arg(long, env = "INVOICEFLOW_ADDR", default_value = "http://127.0.0.1:8300")]
    addr: String,

    /// Tab to act in.
    #[arg(long, env = "INVOICEFLOW_TAB")]
    tab: Option<String>,

    /// Print raw JSON responses.
    #[arg(long, global = true, default_value = "false")]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show server health.
    Status,
    /// Open a new tab and print its id.
    Open {
        /// Print only the tab id.
        #[arg(long, short)]
        quiet: bool,
    },
    /// Close the current tab.
    Close,
    /// Top-level navigation.
    Nav {
        #[command(subcommand)]
        action: NavCommands,
    },
    /// Sign in (the tab must be on the login view).
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account (the tab must be on the login view).
    Signup {
        #[arg(long)]
        business: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        phone: Option<String>,
    },
    /// Sign out.
    Logout,
    /// Dashboard shell: pages, shortcuts, palette, sidebar.
    Shell {
        #[command(subcommand)]
        action: ShellCommands,
    },
    /// Invoice list operations.
    Invoices {
        #[command(subcommand)]
        action: InvoiceCommands,
    },
    /// Compliance assessment.
    Assessment {
        #[command(subcommand)]
        action: AssessmentCommands,
    },
}

#[derive(Subcommand)]
enum NavCommands {
    /// Show the current view.
    Show,
    /// Press "Login" on the landing page.
    Login,
    /// Open the assessment form.
    Assessment,
    /// Press "Back".
    Back,
}

#[derive(Subcommand)]
enum ShellCommands {
    /// Show the shell state.
    Show,
    /// Go to a page.
    Go {
        #[arg(value_parser = PAGES)]
        page: String,
    },
    /// Type a fragment into the address bar.
    Hash { hash: String },
    /// Browser back.
    Back,
    /// Browser forward.
    Forward,
    /// Send a key press.
    Key {
        /// Key value, e.g. `k`, `Escape`, `/`, `g`.
        key: String,
        #[arg(long)]
        ctrl: bool,
        #[arg(long)]
        meta: bool,
    },
    /// List palette entries matching a query.
    Palette {
        #[arg(default_value = "")]
        query: String,
    },
    /// Choose a palette entry.
    Choose {
        #[arg(value_parser = PAGES)]
        page: String,
    },
    /// Collapse or expand the sidebar.
    Sidebar {
        #[arg(action = clap::ArgAction::Set)]
        collapsed: bool,
    },
}

#[derive(Subcommand)]
enum InvoiceCommands {
    /// Show the list, optionally updating the query first.
    List {
        #[arg(long)]
        search: Option<String>,
        /// `all`, `sent`, `validated`, `pending` or `rejected`.
        #[arg(long)]
        status: Option<String>,
        /// `table`, `kanban` or `analytics`.
        #[arg(long)]
        view: Option<String>,
    },
    /// Sort by a column; repeat to flip direction.
    Sort { column: String },
    /// Toggle selection of one invoice.
    Select { id: String },
    /// Select or clear every visible invoice.
    SelectAll,
    /// Toggle the detail row of one invoice.
    Expand { id: String },
    /// Apply an action to the selection.
    Bulk {
        #[arg(value_parser = ["approve", "export", "delete"])]
        action: String,
    },
    /// Export the visible rows as CSV.
    Export {
        /// Output file (default: stdout).
        #[arg(long)]
        output: Option<String>,
    },
    /// Totals by FTA status.
    Stats,
    /// Visible rows grouped by status.
    Kanban,
}

#[derive(Subcommand)]
enum AssessmentCommands {
    /// Book a free assessment.
    Book {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        company: String,
        #[arg(long)]
        erp: String,
        #[arg(long)]
        volume: String,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Days left until the mandate.
    Deadline,
}

// ── Pretty output helpers ────────────────────────────────────────────

fn header(title: &str) {
    println!("{BOLD}{CYAN}{title}{RESET}");
    println!("{DIM}─────────────────────────────────────────{RESET}");
}

fn kv_line(key: &str, value: &str) {
    println!("  {DIM}{key:<20}{RESET} {WHITE}{value}{RESET}");
}

fn success(msg: &str) {
    println!("{GREEN}{BOLD}✓{RESET} {msg}");
}

fn warning(msg: &str) {
    println!("{YELLOW}{BOLD}!{RESET} {YELLOW}{msg}{RESET}");
}

fn text<'a>(value: &'a Value, key: &str) -> &'a str {
    value.get(key).and_then(Value::as_str).unwrap_or("-")
}

fn print_json(value: &Value) {
    if value.is_null() {
        return;
    }
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("failed to format JSON: {e}"),
    }
}

fn print_view(resp: &Value) {
    header("View");
    kv_line("View", text(resp, "view"));
    match resp.get("user").filter(|u| !u.is_null()) {
        Some(user) => kv_line("User", &format!("{} <{}>", text(user, "name"), text(user, "email"))),
        None => kv_line("User", "signed out"),
    }
    println!();
}

fn print_shell(resp: &Value) {
    let flag = |key: &str| resp.get(key).and_then(Value::as_bool).unwrap_or(false);
    header("Dashboard");
    kv_line("Page", text(resp, "page"));
    kv_line("Hash", text(resp, "hash"));
    kv_line("Palette", if flag("paletteOpen") { "open" } else { "closed" });
    kv_line("Sidebar", if flag("sidebarCollapsed") { "collapsed" } else { "expanded" });
    if flag("chordArmed") {
        kv_line("Chord", "g …");
    }
    println!();
}

fn print_list(resp: &Value) {
    let query = &resp["query"];
    header("Invoices");
    kv_line("Search", text(query, "search"));
    kv_line("Status", text(query, "status"));
    kv_line(
        "Sort",
        &format!("{} {}", text(query, "sortBy"), text(query, "sortDir")),
    );
    kv_line("View", text(resp, "viewMode"));
    println!();

    let selected: Vec<&str> = resp["selected"]
        .as_array()
        .map(|a| a.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    let rows = resp["rows"].as_array().map(Vec::as_slice).unwrap_or_default();
    for row in rows {
        let id = text(row, "id");
        let mark = if selected.contains(&id) { "●" } else { " " };
        println!(
            "  {GREEN}{mark}{RESET} {BOLD}{:<14}{RESET} {:<20} {:>12}  {DIM}{}  {}{RESET}",
            text(row, "invoiceNumber"),
            text(row, "client"),
            text(row, "amount"),
            text(row, "invoiceDate"),
            text(row, "status"),
        );
    }
    println!();
    println!(
        "  {DIM}{} of {} invoices{RESET}",
        rows.len(),
        resp["total"].as_u64().unwrap_or(0)
    );
    if resp["focusSearch"].as_bool().unwrap_or(false) {
        println!("  {DIM}search focus requested{RESET}");
    }
}

// ── HTTP client ──────────────────────────────────────────────────────

struct Client {
    http: reqwest::Client,
    addr: String,
    tab: Option<String>,
}

impl Client {
    fn new(addr: String, tab: Option<String>) -> Self {
        let http = reqwest::Client::new();
        Self { http, addr, tab }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.addr.trim_end_matches('/'))
    }

    fn tab_header(&self) -> Result<&str> {
        self.tab.as_deref().ok_or_else(|| {
            anyhow::anyhow!("no tab selected: run `invoiceflow open` and set INVOICEFLOW_TAB")
        })
    }

    async fn send(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&Value>,
        with_tab: bool,
    ) -> Result<reqwest::Response> {
        let mut req = self.http.request(method, self.url(path));
        if with_tab {
            req = req.header("x-tab-id", self.tab_header()?);
        }
        if let Some(body) = body {
            req = req.json(body);
        }
        req.send().await.context("request failed")
    }

    async fn get(&self, path: &str) -> Result<Value> {
        let resp = self.send(reqwest::Method::GET, path, None, true).await?;
        handle_response(resp).await
    }

    async fn get_query(&self, path: &str, query: &[(&str, &str)]) -> Result<Value> {
        let resp = self
            .http
            .get(self.url(path))
            .header("x-tab-id", self.tab_header()?)
            .query(query)
            .send()
            .await
            .context("request failed")?;
        handle_response(resp).await
    }

    async fn get_text(&self, path: &str) -> Result<String> {
        let resp = self.send(reqwest::Method::GET, path, None, true).await?;
        let status = resp.status();
        let body = resp.text().await.context("failed to read response body")?;
        if !status.is_success() {
            bail!("server returned {status}: {body}");
        }
        Ok(body)
    }

    async fn post(&self, path: &str, body: Option<&Value>) -> Result<Value> {
        let resp = self.send(reqwest::Method::POST, path, body, true).await?;
        handle_response(resp).await
    }

    async fn put(&self, path: &str, body: &Value) -> Result<Value> {
        let resp = self.send(reqwest::Method::PUT, path, Some(body), true).await?;
        handle_response(resp).await
    }

    async fn delete(&self, path: &str) -> Result<Value> {
        let resp = self.send(reqwest::Method::DELETE, path, None, true).await?;
        handle_response(resp).await
    }

    async fn get_no_tab(&self, path: &str) -> Result<Value> {
        let resp = self.send(reqwest::Method::GET, path, None, false).await?;
        handle_response(resp).await
    }

    async fn post_no_tab(&self, path: &str, body: Option<&Value>) -> Result<Value> {
        let resp = self.send(reqwest::Method::POST, path, body, false).await?;
        handle_response(resp).await
    }
}

async fn handle_response(resp: reqwest::Response) -> Result<Value> {
    let status = resp.status();
    if status == reqwest::StatusCode::NO_CONTENT {
        return Ok(Value::Null);
    }
    let body = resp.text().await.context("failed to read response body")?;
    if !status.is_success() {
        let parsed: Option<Value> = serde_json::from_str(&body).ok();
        if let Some(message) = parsed.as_ref().and_then(|v| v["message"].as_str()) {
            bail!("server returned {status}: {message}");
        }
        bail!("server returned {status}: {body}");
    }
    if body.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&body).context("failed to parse response JSON")
}

// ── Command dispatch ─────────────────────────────────────────────────

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let raw = cli.json;
    let client = Client::new(cli.addr, cli.tab);

    match run(&client, cli.command, raw).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!();
            eprintln!("  {RED}{BOLD}✗ Error:{RESET} {e:#}");
            eprintln!();
            ExitCode::FAILURE
        }
    }
}

async fn run(client: &Client, cmd: Commands, raw: bool) -> Result<()> {
    match cmd {
        Commands::Status => {
            let resp = client.get_no_tab("/v1/sys/health").await?;
            if raw {
                print_json(&resp);
            } else {
                header("InvoiceFlow");
                kv_line("Status", text(&resp, "status"));
                kv_line("Version", text(&resp, "version"));
                kv_line("Open tabs", &resp["tabs"].as_u64().unwrap_or(0).to_string());
                println!();
            }
            Ok(())
        }
        Commands::Open { quiet } => {
            let resp = client.post_no_tab("/v1/tabs", None).await?;
            let id = text(&resp, "tabId");
            if quiet {
                println!("{id}");
            } else if raw {
                print_json(&resp);
            } else {
                success(&format!("tab opened on {}", text(&resp, "view")));
                println!("  export INVOICEFLOW_TAB={id}");
            }
            Ok(())
        }
        Commands::Close => {
            client.delete("/v1/tabs/current").await?;
            success("tab closed");
            Ok(())
        }
        Commands::Nav { action } => cmd_nav(client, action, raw).await,
        Commands::Login { email, password } => {
            let body = json!({ "email": email, "password": password });
            let resp = client.post("/v1/auth/login", Some(&body)).await?;
            report_auth(&resp, raw);
            Ok(())
        }
        Commands::Signup {
            business,
            email,
            password,
            phone,
        } => {
            let body = json!({
                "businessName": business,
                "email": email,
                "password": password,
                "phone": phone,
            });
            let resp = client.post("/v1/auth/signup", Some(&body)).await?;
            report_auth(&resp, raw);
            Ok(())
        }
        Commands::Logout => {
            let resp = client.post("/v1/auth/logout", None).await?;
            if raw {
                print_json(&resp);
            } else {
                success("signed out");
            }
            Ok(())
        }
        Commands::Shell { action } => cmd_shell(client, action, raw).await,
        Commands::Invoices { action } => cmd_invoices(client, action, raw).await,
        Commands::Assessment { action } => cmd_assessment(client, action, raw).await,
    }
}

fn report_auth(resp: &Value, raw: bool) {
    if raw {
        print_json(resp);
    } else if text(resp, "outcome") == "stale" {
        warning("the tab left the login page before the reply arrived; nothing changed");
    } else {
        let name = resp["user"].get("name").and_then(Value::as_str).unwrap_or("-");
        success(&format!("signed in as {name}"));
    }
}

// ── Navigation ───────────────────────────────────────────────────────

async fn cmd_nav(client: &Client, action: NavCommands, raw: bool) -> Result<()> {
    let resp = match action {
        NavCommands::Show => client.get("/v1/view").await?,
        NavCommands::Login => client.post("/v1/view/login", None).await?,
        NavCommands::Assessment => client.post("/v1/view/assessment", None).await?,
        NavCommands::Back => client.post("/v1/view/back", None).await?,
    };
    if raw {
        print_json(&resp);
    } else {
        print_view(&resp);
    }
    Ok(())
}

// ── Dashboard shell ──────────────────────────────────────────────────

async fn cmd_shell(client: &Client, action: ShellCommands, raw: bool) -> Result<()> {
    let resp = match action {
        ShellCommands::Show => client.get("/v1/dashboard").await?,
        ShellCommands::Go { page } => {
            client
                .post("/v1/dashboard/navigate", Some(&json!({ "page": page })))
                .await?
        }
        ShellCommands::Hash { hash } => {
            client
                .post("/v1/dashboard/hash", Some(&json!({ "hash": hash })))
                .await?
        }
        ShellCommands::Back => client.post("/v1/dashboard/history/back", None).await?,
        ShellCommands::Forward => client.post("/v1/dashboard/history/forward", None).await?,
        ShellCommands::Key { key, ctrl, meta } => {
            let body = json!({ "key": key, "ctrl": ctrl, "meta": meta });
            let resp = client.post("/v1/dashboard/keys", Some(&body)).await?;
            if raw {
                print_json(&resp);
            } else {
                kv_line("Action", text(&resp, "action"));
                println!();
                print_shell(&resp["shell"]);
            }
            return Ok(());
        }
        ShellCommands::Palette { query } => {
            let resp = client
                .get_query("/v1/dashboard/palette", &[("q", query.as_str())])
                .await?;
            if raw {
                print_json(&resp);
            } else {
                header("Palette");
                for entry in resp["entries"].as_array().map(Vec::as_slice).unwrap_or_default() {
                    kv_line(text(entry, "label"), text(entry, "shortcut"));
                }
                println!();
            }
            return Ok(());
        }
        ShellCommands::Choose { page } => {
            client
                .post("/v1/dashboard/palette", Some(&json!({ "page": page })))
                .await?
        }
        ShellCommands::Sidebar { collapsed } => {
            client
                .put("/v1/dashboard/sidebar", &json!({ "collapsed": collapsed }))
                .await?
        }
    };
    if raw {
        print_json(&resp);
    } else {
        print_shell(&resp);
    }
    Ok(())
}

// ── Invoice list ─────────────────────────────────────────────────────

async fn cmd_invoices(client: &Client, action: InvoiceCommands, raw: bool) -> Result<()> {
    match action {
        InvoiceCommands::List {
            search,
            status,
            view,
        } => {
            let resp = if search.is_none() && status.is_none() && view.is_none() {
                client.get("/v1/invoices").await?
            } else {
                let body = json!({ "search": search, "status": status, "viewMode": view });
                client.put("/v1/invoices/query", &body).await?
            };
            if raw {
                print_json(&resp);
            } else {
                print_list(&resp);
            }
        }
        InvoiceCommands::Sort { column } => {
            let resp = client
                .post("/v1/invoices/sort", Some(&json!({ "column": column })))
                .await?;
            if raw {
                print_json(&resp);
            } else {
                success(&format!(
                    "sorted by {} {}",
                    text(&resp, "column"),
                    text(&resp, "direction")
                ));
            }
        }
        InvoiceCommands::Select { id } => {
            let resp = client.post(&format!("/v1/invoices/{id}/select"), None).await?;
            toggled(&resp, "selected", "deselected", raw);
        }
        InvoiceCommands::Expand { id } => {
            let resp = client.post(&format!("/v1/invoices/{id}/expand"), None).await?;
            toggled(&resp, "expanded", "collapsed", raw);
        }
        InvoiceCommands::SelectAll => {
            let resp = client.post("/v1/invoices/select-all", None).await?;
            if raw {
                print_json(&resp);
            } else {
                success(&format!("{} selected", resp["selected"].as_u64().unwrap_or(0)));
            }
        }
        InvoiceCommands::Bulk { action } => {
            let resp = client
                .post("/v1/invoices/bulk", Some(&json!({ "action": action })))
                .await?;
            if raw {
                print_json(&resp);
            } else {
                let count = resp["ids"].as_array().map_or(0, Vec::len);
                success(&format!("{action} applied to {count} invoice(s)"));
            }
        }
        InvoiceCommands::Export { output } => {
            let csv = client.get_text("/v1/invoices/export").await?;
            match output {
                Some(path) => {
                    std::fs::write(&path, &csv)
                        .with_context(|| format!("failed to write {path}"))?;
                    success(&format!("exported to {path}"));
                }
                None => println!("{csv}"),
            }
        }
        InvoiceCommands::Stats => {
            let resp = client.get("/v1/invoices/stats").await?;
            if raw {
                print_json(&resp);
            } else {
                header("Invoice totals");
                for (label, key) in [
                    ("Total", "totalInvoices"),
                    ("Approved", "approved"),
                    ("Validated", "validated"),
                    ("Pending", "pending"),
                    ("Rejected", "rejected"),
                ] {
                    kv_line(label, &resp[key].as_u64().unwrap_or(0).to_string());
                }
                kv_line(
                    "Amount (AED)",
                    &format!("{:.2}", resp["totalAmount"].as_f64().unwrap_or(0.0)),
                );
                println!();
            }
        }
        InvoiceCommands::Kanban => {
            let resp = client.get("/v1/invoices/kanban").await?;
            if raw {
                print_json(&resp);
            } else {
                for column in resp["columns"].as_array().map(Vec::as_slice).unwrap_or_default() {
                    header(text(column, "status"));
                    for card in column["invoices"].as_array().map(Vec::as_slice).unwrap_or_default() {
                        kv_line(text(card, "invoiceNumber"), text(card, "client"));
                    }
                    println!();
                }
            }
        }
    }
    Ok(())
}

fn toggled(resp: &Value, on: &str, off: &str, raw: bool) {
    if raw {
        print_json(resp);
    } else {
        let state = if resp["on"].as_bool().unwrap_or(false) { on } else { off };
        success(&format!("invoice {} {state}", text(resp, "id")));
    }
}

// ── Assessment ───────────────────────────────────────────────────────

async fn cmd_assessment(client: &Client, action: AssessmentCommands, raw: bool) -> Result<()> {
    match action {
        AssessmentCommands::Book {
            name,
            email,
            phone,
            company,
            erp,
            volume,
            notes,
        } => {
            let body = json!({
                "fullName": name,
                "email": email,
                "phone": phone,
                "companyName": company,
                "currentERP": erp,
                "invoicesPerMonth": volume,
                "additionalNotes": notes.unwrap_or_default(),
            });
            let resp = client.post_no_tab("/v1/assessment", Some(&body)).await?;
            if raw {
                print_json(&resp);
            } else {
                success(text(&resp, "message"));
                for (i, step) in resp["nextSteps"]
                    .as_array()
                    .map(Vec::as_slice)
                    .unwrap_or_default()
                    .iter()
                    .enumerate()
                {
                    println!("  {DIM}{}.{RESET} {}", i.saturating_add(1), step.as_str().unwrap_or(""));
                }
            }
        }
        AssessmentCommands::Deadline => {
            let resp = client.get_no_tab("/v1/assessment/deadline").await?;
            if raw {
                print_json(&resp);
            } else {
                let days = resp["daysRemaining"].as_i64().unwrap_or(0);
                header("Compliance deadline");
                kv_line("Deadline", text(&resp, "deadline"));
                if days >= 0 {
                    kv_line("Days remaining", &days.to_string());
                } else {
                    kv_line("Days overdue", &days.saturating_neg().to_string());
                }
                println!();
            }
        }
    }
    Ok(())
}
