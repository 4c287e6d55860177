use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::stdout;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::accounts::{Account, AccountStore};
use crate::config::Config;
use crate::mail::imap::ImapConnector;
use crate::mail::smtp::suggest_smtp_host;
use crate::mail::{
    gateway, FetchOutcome, FolderKey, FolderRequest, NormalizedMessage, Outcome, SendRequest,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum View {
    List,
    Mail,
    Compose,
    Accounts,
    AccountForm,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComposeField {
    To,
    Subject,
    Body,
}

pub struct ComposeState {
    pub to: String,
    pub subject: String,
    pub body: String,   // editable
    pub quote: String,  // readonly quoted block (for Reply)
    pub focus: ComposeField,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormField {
    Label,
    User,
    Pass,
    Host,
    Port,
    Secure,
    SmtpHost,
}

/// Login / account-edit form. `id` is fixed when the form opens, so repeated
/// submits of one form always name the same account.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountForm {
    pub id: String,
    pub editing: bool,
    pub focus: FormField,

    pub label: String,
    pub user: String,
    pub pass: String,
    pub host: String,
    pub port: String,
    pub secure: bool,
    pub smtp_host: String,
}

impl AccountForm {
    pub fn blank() -> Self {
        Self {
            id: Account::new_id(),
            editing: false,
            focus: FormField::Label,
            label: String::new(),
            user: String::new(),
            pass: String::new(),
            host: "imap.gmail.com".to_string(),
            port: "993".to_string(),
            secure: true,
            smtp_host: String::new(),
        }
    }

    pub fn from_account(a: &Account) -> Self {
        Self {
            id: a.id.clone(),
            editing: true,
            focus: FormField::Label,
            label: a.label.clone(),
            user: a.user.clone(),
            pass: a.pass.clone(),
            host: a.host.clone(),
            port: a.port.to_string(),
            secure: a.secure,
            smtp_host: a.smtp_host.clone(),
        }
    }

    /// Builds the account this form describes, without contacting any server.
    pub fn to_account(&self) -> Result<Account, String> {
        let user = self.user.trim();
        let host = self.host.trim();
        let smtp_host = self.smtp_host.trim();

        if user.is_empty() {
            return Err("User is empty".to_string());
        }
        if host.is_empty() {
            return Err("Host is empty".to_string());
        }
        let port: u16 = self
            .port
            .trim()
            .parse()
            .map_err(|_| format!("Invalid port: {}", self.port))?;
        if smtp_host.is_empty() {
            return Err("SMTP host is empty".to_string());
        }

        let label = match self.label.trim() {
            "" => user.to_string(),
            l => l.to_string(),
        };

        Ok(Account {
            id: self.id.clone(),
            label,
            host: host.to_string(),
            port,
            secure: self.secure,
            user: user.to_string(),
            pass: self.pass.clone(),
            smtp_host: smtp_host.to_string(),
        })
    }

    /// Moves focus forward. Leaving the host field pre-fills an empty SMTP
    /// host with a suggestion the user can still edit.
    pub fn focus_next(&mut self) {
        if self.focus == FormField::Host && self.smtp_host.is_empty() {
            if let Some(s) = suggest_smtp_host(&self.host) {
                self.smtp_host = s;
            }
        }
        self.focus = next_field(self.focus);
    }

    pub fn focus_prev(&mut self) {
        self.focus = prev_field(self.focus);
    }

    fn field_mut(&mut self, f: FormField) -> Option<&mut String> {
        match f {
            FormField::Label => Some(&mut self.label),
            FormField::User => Some(&mut self.user),
            FormField::Pass => Some(&mut self.pass),
            FormField::Host => Some(&mut self.host),
            FormField::Port => Some(&mut self.port),
            FormField::SmtpHost => Some(&mut self.smtp_host),
            FormField::Secure => None,
        }
    }

    pub fn type_char(&mut self, ch: char) {
        let focus = self.focus;
        if focus == FormField::Port && !ch.is_ascii_digit() {
            return;
        }
        if focus == FormField::Secure {
            if ch == ' ' {
                self.secure = !self.secure;
                // keep the port in step with the usual convention
                self.port = match (self.secure, self.port.as_str()) {
                    (true, "143") => "993".to_string(),
                    (false, "993") => "143".to_string(),
                    (_, p) => p.to_string(),
                };
            }
            return;
        }
        if let Some(s) = self.field_mut(focus) {
            s.push(ch);
        }
    }

    pub fn backspace(&mut self) {
        let focus = self.focus;
        if let Some(s) = self.field_mut(focus) {
            s.pop();
        }
    }
}

fn next_field(f: FormField) -> FormField {
    use FormField::*;
    match f {
        Label => User,
        User => Pass,
        Pass => Host,
        Host => Port,
        Port => Secure,
        Secure => SmtpHost,
        SmtpHost => Label,
    }
}

fn prev_field(f: FormField) -> FormField {
    use FormField::*;
    match f {
        Label => SmtpHost,
        User => Label,
        Pass => User,
        Host => Pass,
        Port => Host,
        Secure => Port,
        SmtpHost => Secure,
    }
}

pub struct App {
    pub view: View,
    pub return_view: View,

    pub accounts: Vec<Account>,
    pub active: Option<usize>,
    pub folder: FolderKey,

    pub messages: Vec<NormalizedMessage>,
    pub selected: usize,
    pub loading: bool,

    pub current: Option<NormalizedMessage>,
    pub body_scroll: u16,

    pub compose: ComposeState,

    pub form: AccountForm,
    pub checking_login: bool,
    pub manager_selected: usize,
    pub pending_removal: Option<String>,

    pub status: String,

    pub config: Config,
    pub store: AccountStore,
}

enum AppMsg {
    Fetched {
        account_id: String,
        folder: FolderKey,
        outcome: FetchOutcome,
    },
    Sent(Outcome),
    LoginChecked {
        account: Account,
        outcome: Outcome,
    },
}

fn clamp_dec(v: usize) -> usize {
    v.saturating_sub(1)
}

impl App {
    pub fn new(config: Config, store: AccountStore) -> Self {
        let accounts = store.load();
        let active = if accounts.is_empty() { None } else { Some(0) };

        Self {
            view: if accounts.is_empty() { View::AccountForm } else { View::List },
            return_view: View::List,

            accounts,
            active,
            folder: FolderKey::Inbox,

            messages: vec![],
            selected: 0,
            loading: false,

            current: None,
            body_scroll: 0,

            compose: ComposeState {
                to: String::new(),
                subject: String::new(),
                body: String::new(),
                quote: String::new(),
                focus: ComposeField::To,
            },

            form: AccountForm::blank(),
            checking_login: false,
            manager_selected: 0,
            pending_removal: None,

            status: "Starting...".to_string(),

            config,
            store,
        }
    }

    pub fn active_account(&self) -> Option<&Account> {
        self.active.and_then(|i| self.accounts.get(i))
    }

    fn apply(&mut self, msg: AppMsg, tx: &mpsc::UnboundedSender<AppMsg>) {
        match msg {
            AppMsg::Fetched { account_id, folder, outcome } => {
                let current = self.active_account().map(|a| a.id.as_str()) == Some(account_id.as_str())
                    && self.folder == folder;
                if !current {
                    log::debug!("ignoring stale fetch of {folder} for {account_id}");
                    return;
                }
                self.loading = false;
                if outcome.success {
                    self.messages = outcome.messages;
                    self.selected = self.selected.min(self.messages.len().saturating_sub(1));
                    self.status = format!("Loaded {} messages from {folder}", self.messages.len());
                } else {
                    self.messages.clear();
                    self.selected = 0;
                    self.status = format!(
                        "Fetch error [{folder}]: {}",
                        outcome.error.unwrap_or_else(|| "unknown error".to_string())
                    );
                }
            }
            AppMsg::Sent(outcome) => {
                if outcome.success {
                    self.reset_compose();
                    self.view = View::List;
                    self.status = "Sent".to_string();
                } else {
                    self.status = format!(
                        "Send failed: {}",
                        outcome.error.unwrap_or_else(|| "unknown error".to_string())
                    );
                }
            }
            AppMsg::LoginChecked { account, outcome } => {
                self.checking_login = false;
                if !outcome.success {
                    self.status = format!(
                        "Connection failed: {}",
                        outcome.error.unwrap_or_else(|| "unknown error".to_string())
                    );
                    return;
                }
                match self.commit_account(account) {
                    Ok(()) => {
                        self.form = AccountForm::blank();
                        self.view = View::List;
                        self.refresh(tx);
                    }
                    Err(e) => self.status = format!("Save error: {e}"),
                }
            }
        }
    }

    /// Stores a validated account: replaces it when editing, appends it
    /// otherwise. The committed account becomes active.
    fn commit_account(&mut self, account: Account) -> Result<()> {
        let id = account.id.clone();
        let existing = self.accounts.iter().position(|a| a.id == id);

        match existing {
            Some(i) => {
                self.store.update(&mut self.accounts, account)?;
                self.active = Some(i);
                self.status = "Account updated".to_string();
            }
            None => {
                self.store.add(&mut self.accounts, account)?;
                self.active = Some(self.accounts.len() - 1);
                self.status = "Account added".to_string();
            }
        }
        self.messages.clear();
        self.selected = 0;
        Ok(())
    }

    fn remove_account(&mut self, id: &str) -> Result<()> {
        let active_id = self.active_account().map(|a| a.id.clone());
        if !self.store.remove(&mut self.accounts, id)? {
            return Ok(());
        }

        self.active = match active_id {
            Some(a) if a != id => self.accounts.iter().position(|x| x.id == a),
            _ if self.accounts.is_empty() => None,
            _ => {
                self.messages.clear();
                self.selected = 0;
                Some(0)
            }
        };
        self.manager_selected = self.manager_selected.min(self.accounts.len().saturating_sub(1));
        self.status = "Account removed".to_string();
        Ok(())
    }

    fn refresh(&mut self, tx: &mpsc::UnboundedSender<AppMsg>) {
        let Some(account) = self.active_account().cloned() else {
            self.status = "No account. Press a to add one.".to_string();
            return;
        };
        self.loading = true;
        self.status = format!("Fetching {} for {}...", self.folder, account.label);
        spawn_fetch(account, self.folder, tx.clone());
    }

    fn switch_folder(&mut self, folder: FolderKey, tx: &mpsc::UnboundedSender<AppMsg>) {
        if self.folder != folder {
            self.folder = folder;
            self.messages.clear();
            self.selected = 0;
        }
        self.refresh(tx);
    }

    fn cycle_account(&mut self, forward: bool, tx: &mpsc::UnboundedSender<AppMsg>) {
        let n = self.accounts.len();
        if n < 2 {
            return;
        }
        let i = self.active.unwrap_or(0);
        self.active = Some(if forward { (i + 1) % n } else { (i + n - 1) % n });
        self.messages.clear();
        self.selected = 0;
        self.refresh(tx);
    }

    fn reset_compose(&mut self) {
        self.compose.to.clear();
        self.compose.subject.clear();
        self.compose.body.clear();
        self.compose.quote.clear();
        self.compose.focus = ComposeField::To;
    }

    fn start_compose(&mut self) {
        if self.active_account().is_none() {
            self.status = "No account to send from".to_string();
            return;
        }
        self.reset_compose();
        self.view = View::Compose;
        self.status = "Compose".to_string();
    }

    fn start_reply(&mut self) {
        let Some(m) = self.current.clone() else {
            self.status = "No mail selected".to_string();
            return;
        };

        self.compose.to = extract_reply_to(&m.from);
        self.compose.subject = make_reply_subject(&m.subject);
        self.compose.body.clear();
        self.compose.quote = make_reply_quote(&m);
        self.compose.focus = ComposeField::Body;

        self.view = View::Compose;
        self.status = "Reply".to_string();
    }

    fn open_form(&mut self, form: AccountForm) {
        self.return_view = self.view;
        self.form = form;
        self.view = View::AccountForm;
        self.status = if self.form.editing {
            "Edit account".to_string()
        } else {
            "Add account".to_string()
        };
    }
}

pub async fn run(config: Config, store: AccountStore) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<AppMsg>();
    let mut app = App::new(config, store);

    if app.active.is_some() {
        app.refresh(&tx);
    } else {
        app.status = "No accounts yet. Fill in the form and press Ctrl+S.".to_string();
    }

    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    loop {
        while let Ok(msg) = rx.try_recv() {
            app.apply(msg, &tx);
        }

        terminal.draw(|f| crate::ui::draw(f, &app))?;

        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Resize(_, _) => {
                    terminal.clear()?;
                    continue;
                }
                Event::Key(k) => {
                    if k.kind != KeyEventKind::Press {
                        continue;
                    }

                    if k.modifiers.contains(KeyModifiers::CONTROL) && k.code == KeyCode::Char('c') {
                        break;
                    }
                    let typing = matches!(app.view, View::Compose | View::AccountForm);
                    if !typing && k.code == KeyCode::Char('q') {
                        break;
                    }

                    match app.view {
                        View::List => handle_list_keys(&mut app, k.code, &tx),
                        View::Mail => handle_mail_keys(&mut app, k.code, &tx),
                        View::Compose => handle_compose_keys(&mut app, k.code, k.modifiers, &tx),
                        View::Accounts => handle_accounts_keys(&mut app, k.code),
                        View::AccountForm => handle_form_keys(&mut app, k.code, k.modifiers, &tx),
                    }
                }
                _ => {}
            }
        }
    }

    Ok(())
}

fn spawn_fetch(account: Account, folder: FolderKey, tx: mpsc::UnboundedSender<AppMsg>) {
    tokio::task::spawn_blocking(move || {
        let outcome = gateway::fetch_folder(&ImapConnector, &account.server(), &FolderRequest::from(folder));
        let _ = tx.send(AppMsg::Fetched {
            account_id: account.id,
            folder,
            outcome,
        });
    });
}

fn spawn_send(app: &App, req: SendRequest, tx: mpsc::UnboundedSender<AppMsg>) {
    let Some(account) = app.active_account() else {
        return;
    };
    let outbound = account.outbound(&app.config.outbound);
    let from = account.user.clone();

    tokio::task::spawn_blocking(move || {
        let outcome = gateway::send_message(&outbound, &from, &req);
        let _ = tx.send(AppMsg::Sent(outcome));
    });
}

fn spawn_login_check(account: Account, tx: mpsc::UnboundedSender<AppMsg>) {
    tokio::task::spawn_blocking(move || {
        let outcome = gateway::test_login(&ImapConnector, &account.server());
        let _ = tx.send(AppMsg::LoginChecked { account, outcome });
    });
}

fn compose_full_body(c: &ComposeState) -> String {
    let body = c.body.trim_end().to_string();
    let quote = c.quote.trim_end().to_string();

    if quote.is_empty() {
        body
    } else if body.is_empty() {
        quote
    } else {
        format!("{body}\n\n{quote}")
    }
}

fn extract_reply_to(from: &str) -> String {
    let s = from.trim();

    if let Some(l) = s.find('<') {
        if let Some(r) = s[l + 1..].find('>') {
            let addr = s[l + 1..l + 1 + r].trim();
            if !addr.is_empty() {
                return addr.to_string();
            }
        }
    }

    for tok in s.split_whitespace() {
        let t = tok.trim_matches(|c: char| c == '<' || c == '>' || c == ',' || c == ';');
        if t.contains('@') {
            return t.to_string();
        }
    }

    // "(Unknown)" placeholder and the like
    String::new()
}

fn make_reply_subject(subject: &str) -> String {
    let s = subject.trim();
    if s.is_empty() || s == "(No Subject)" {
        "Re:".to_string()
    } else if s.to_ascii_lowercase().starts_with("re:") {
        s.to_string()
    } else {
        format!("Re: {s}")
    }
}

fn quote_lines(text: &str) -> String {
    let mut out = String::new();
    for (i, line) in text.replace("\r\n", "\n").lines().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str("> ");
        out.push_str(line);
    }
    if out.is_empty() {
        out.push_str("> ");
    }
    out
}

fn make_reply_quote(m: &NormalizedMessage) -> String {
    let date = m.date.format("%a, %d %b %Y %H:%M UTC");
    let intro = format!("On {date}, {} wrote:", m.from);
    format!("{intro}\n{}", quote_lines(&m.text_body))
}

fn handle_list_keys(app: &mut App, code: KeyCode, tx: &mpsc::UnboundedSender<AppMsg>) {
    match code {
        KeyCode::Char('j') | KeyCode::Down => {
            if !app.messages.is_empty() {
                app.selected = (app.selected + 1).min(app.messages.len() - 1);
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.selected = clamp_dec(app.selected);
        }
        KeyCode::Enter => {
            if let Some(m) = app.messages.get(app.selected).cloned() {
                app.current = Some(m);
                app.body_scroll = 0;
                app.view = View::Mail;
            }
        }
        KeyCode::Char(ch @ '1'..='5') => {
            let i = ch as usize - '1' as usize;
            app.switch_folder(FolderKey::ALL[i], tx);
        }
        KeyCode::Char(']') => app.cycle_account(true, tx),
        KeyCode::Char('[') => app.cycle_account(false, tx),
        KeyCode::Char('o') => app.refresh(tx),
        KeyCode::Char('c') => app.start_compose(),
        KeyCode::Char('a') => {
            app.manager_selected = app.active.unwrap_or(0);
            app.pending_removal = None;
            app.view = View::Accounts;
            app.status = "Accounts".to_string();
        }
        _ => {}
    }
}

fn handle_mail_keys(app: &mut App, code: KeyCode, tx: &mpsc::UnboundedSender<AppMsg>) {
    match code {
        KeyCode::Esc => {
            app.view = View::List;
            app.status = "Back".to_string();
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.body_scroll = app.body_scroll.saturating_add(1);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.body_scroll = app.body_scroll.saturating_sub(1);
        }
        KeyCode::Char('c') => app.start_compose(),
        KeyCode::Char('r') => app.start_reply(),
        KeyCode::Char('o') => app.refresh(tx),
        _ => {}
    }
}

fn handle_compose_keys(app: &mut App, code: KeyCode, mods: KeyModifiers, tx: &mpsc::UnboundedSender<AppMsg>) {
    if mods.contains(KeyModifiers::CONTROL) && matches!(code, KeyCode::Char('s')) {
        if app.compose.to.trim().is_empty() {
            app.status = "To is empty".to_string();
            return;
        }

        let req = SendRequest {
            to: app.compose.to.trim().to_string(),
            subject: app.compose.subject.clone(),
            text: compose_full_body(&app.compose),
        };
        app.status = "Sending...".to_string();
        spawn_send(app, req, tx.clone());
        return;
    }

    match code {
        KeyCode::Esc => {
            app.view = View::List;
            app.status = "Compose canceled".to_string();
        }
        KeyCode::Tab => {
            app.compose.focus = match app.compose.focus {
                ComposeField::To => ComposeField::Subject,
                ComposeField::Subject => ComposeField::Body,
                ComposeField::Body => ComposeField::To,
            };
        }
        KeyCode::Backspace => match app.compose.focus {
            ComposeField::To => {
                app.compose.to.pop();
            }
            ComposeField::Subject => {
                app.compose.subject.pop();
            }
            ComposeField::Body => {
                app.compose.body.pop();
            }
        },
        KeyCode::Enter => {
            if app.compose.focus == ComposeField::Body {
                app.compose.body.push('\n');
            } else {
                app.compose.focus = match app.compose.focus {
                    ComposeField::To => ComposeField::Subject,
                    ComposeField::Subject | ComposeField::Body => ComposeField::Body,
                };
            }
        }
        KeyCode::Char(ch) => match app.compose.focus {
            ComposeField::To => app.compose.to.push(ch),
            ComposeField::Subject => app.compose.subject.push(ch),
            ComposeField::Body => app.compose.body.push(ch),
        },
        _ => {}
    }
}

fn handle_accounts_keys(app: &mut App, code: KeyCode) {
    if let Some(id) = app.pending_removal.take() {
        if code == KeyCode::Char('y') {
            if let Err(e) = app.remove_account(&id) {
                app.status = format!("Save error: {e}");
            }
        } else {
            app.status = "Removal canceled".to_string();
        }
        return;
    }

    match code {
        KeyCode::Esc => {
            app.view = View::List;
            app.status = "Back".to_string();
        }
        KeyCode::Char('j') | KeyCode::Down => {
            if !app.accounts.is_empty() {
                app.manager_selected = (app.manager_selected + 1).min(app.accounts.len() - 1);
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.manager_selected = clamp_dec(app.manager_selected);
        }
        KeyCode::Enter => {
            if app.manager_selected < app.accounts.len() {
                app.active = Some(app.manager_selected);
                app.messages.clear();
                app.selected = 0;
                app.view = View::List;
                app.status = "Press o to load".to_string();
            }
        }
        KeyCode::Char('n') => app.open_form(AccountForm::blank()),
        KeyCode::Char('e') => {
            if let Some(a) = app.accounts.get(app.manager_selected) {
                let form = AccountForm::from_account(a);
                app.open_form(form);
            }
        }
        KeyCode::Char('d') => {
            if let Some(a) = app.accounts.get(app.manager_selected) {
                app.status = format!("Remove {}? This cannot be undone. (y/n)", a.label);
                app.pending_removal = Some(a.id.clone());
            }
        }
        _ => {}
    }
}

fn handle_form_keys(app: &mut App, code: KeyCode, mods: KeyModifiers, tx: &mpsc::UnboundedSender<AppMsg>) {
    if mods.contains(KeyModifiers::CONTROL) && matches!(code, KeyCode::Char('s')) {
        if app.checking_login {
            app.status = "Login test already running...".to_string();
            return;
        }
        match app.form.to_account() {
            Ok(account) => {
                app.checking_login = true;
                app.status = format!("Testing login for {}...", account.user);
                spawn_login_check(account, tx.clone());
            }
            Err(e) => app.status = format!("Form invalid: {e}"),
        }
        return;
    }

    match code {
        KeyCode::Esc => {
            if app.accounts.is_empty() {
                app.status = "Add an account first (Ctrl+C quits)".to_string();
                return;
            }
            app.view = app.return_view;
            app.status = "Back".to_string();
        }
        KeyCode::Tab | KeyCode::Enter => app.form.focus_next(),
        KeyCode::BackTab => app.form.focus_prev(),
        KeyCode::Backspace => app.form.backspace(),
        KeyCode::Char(ch) => app.form.type_char(ch),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rstest::*;
    use tempfile::TempDir;

    use super::*;

    #[fixture]
    fn dir() -> TempDir {
        tempfile::tempdir().unwrap()
    }

    fn app_in(dir: &TempDir) -> App {
        let config = Config {
            outbound: Default::default(),
            log: Default::default(),
        };
        App::new(config, AccountStore::at(dir.path().join("accounts.json")))
    }

    fn filled_form() -> AccountForm {
        AccountForm {
            label: String::new(),
            user: "a@x.com".into(),
            pass: "p".into(),
            host: "imap.x.com".into(),
            smtp_host: "smtp.x.com".into(),
            ..AccountForm::blank()
        }
    }

    #[rstest]
    #[case("Alice <alice@example.com>", "alice@example.com")]
    #[case("bob@example.com", "bob@example.com")]
    #[case("(Unknown)", "")]
    fn test_extract_reply_to(#[case] from: &str, #[case] expected: &str) {
        assert_eq!(extract_reply_to(from), expected);
    }

    #[rstest]
    #[case("Hello", "Re: Hello")]
    #[case("RE: Hello", "RE: Hello")]
    #[case("(No Subject)", "Re:")]
    fn test_reply_subject(#[case] subject: &str, #[case] expected: &str) {
        assert_eq!(make_reply_subject(subject), expected);
    }

    #[rstest]
    fn test_reply_quote_prefixes_every_line() {
        let m = NormalizedMessage {
            uid: 1,
            subject: "s".into(),
            from: "b@y.com".into(),
            date: chrono::Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 0).unwrap(),
            html_body: String::new(),
            text_body: "one\r\ntwo".into(),
            folder: "INBOX".into(),
        };
        assert_eq!(
            make_reply_quote(&m),
            "On Mon, 06 May 2024 07:08 UTC, b@y.com wrote:\n> one\n> two"
        );
    }

    #[rstest]
    fn test_form_label_defaults_to_user() {
        let account = filled_form().to_account().unwrap();
        assert_eq!(account.label, "a@x.com");
        assert_eq!(account.port, 993);
    }

    #[rstest]
    fn test_form_requires_smtp_host() {
        let form = AccountForm { smtp_host: String::new(), ..filled_form() };
        assert!(form.to_account().is_err());
    }

    #[rstest]
    fn test_form_rejects_bad_port() {
        let form = AccountForm { port: "99999".into(), ..filled_form() };
        assert!(form.to_account().is_err());
    }

    #[rstest]
    fn test_edit_form_keeps_id() {
        let mut form = filled_form();
        form.id = "abc".into();
        form.editing = true;
        assert_eq!(form.to_account().unwrap().id, "abc");
    }

    #[rstest]
    fn test_resubmitted_add_form_names_one_account(dir: TempDir) {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = app_in(&dir);
        app.form = filled_form();

        for _ in 0..2 {
            let account = app.form.to_account().unwrap();
            app.commit_account(account).unwrap();
        }
        assert_eq!(app.accounts.len(), 1);
        assert_eq!(app.store.load().len(), 1);

        // a failed check clears the in-flight flag without touching the store
        app.checking_login = true;
        app.apply(
            AppMsg::LoginChecked {
                account: filled_form().to_account().unwrap(),
                outcome: Outcome::failed("authentication rejected"),
            },
            &tx,
        );
        assert!(!app.checking_login);
        assert_eq!(app.accounts.len(), 1);
    }

    #[rstest]
    fn test_submit_is_ignored_while_login_check_runs(dir: TempDir) {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = app_in(&dir);
        app.form = filled_form();
        app.checking_login = true;

        handle_form_keys(&mut app, KeyCode::Char('s'), KeyModifiers::CONTROL, &tx);
        assert_eq!(app.status, "Login test already running...");
    }

    #[rstest]
    fn test_leaving_host_suggests_smtp_host() {
        let mut form = AccountForm { focus: FormField::Host, ..AccountForm::blank() };
        form.focus_next();
        assert_eq!(form.smtp_host, "smtp.gmail.com");
        assert_eq!(form.focus, FormField::Port);
    }

    #[rstest]
    fn test_suggestion_never_overwrites_user_input() {
        let mut form = AccountForm {
            focus: FormField::Host,
            smtp_host: "mail.relay.net".into(),
            ..AccountForm::blank()
        };
        form.focus_next();
        assert_eq!(form.smtp_host, "mail.relay.net");
    }

    #[rstest]
    fn test_secure_toggle_flips_default_port() {
        let mut form = AccountForm { focus: FormField::Secure, ..AccountForm::blank() };
        form.type_char(' ');
        assert!(!form.secure);
        assert_eq!(form.port, "143");
    }

    #[rstest]
    fn test_port_accepts_digits_only() {
        let mut form = AccountForm { focus: FormField::Port, port: String::new(), ..AccountForm::blank() };
        form.type_char('9');
        form.type_char('x');
        assert_eq!(form.port, "9");
    }

    #[rstest]
    fn test_commit_adds_then_updates(dir: TempDir) {
        let mut app = app_in(&dir);
        assert_eq!(app.view, View::AccountForm);

        let account = filled_form().to_account().unwrap();
        app.commit_account(account.clone()).unwrap();
        assert_eq!(app.active, Some(0));

        let renamed = Account { label: "renamed".into(), ..account };
        app.commit_account(renamed).unwrap();
        assert_eq!(app.accounts.len(), 1);
        assert_eq!(app.store.load()[0].label, "renamed");
    }

    #[rstest]
    fn test_removing_active_account_falls_back_to_first(dir: TempDir) {
        let mut app = app_in(&dir);
        let a = filled_form().to_account().unwrap();
        let b = filled_form().to_account().unwrap();
        app.commit_account(a.clone()).unwrap();
        app.commit_account(b.clone()).unwrap();
        assert_eq!(app.active, Some(1));

        app.remove_account(&b.id).unwrap();
        assert_eq!(app.active, Some(0));
        assert_eq!(app.active_account().map(|x| x.id.clone()), Some(a.id.clone()));

        app.remove_account(&a.id).unwrap();
        assert_eq!(app.active, None);
    }

    #[rstest]
    fn test_removing_other_account_keeps_active(dir: TempDir) {
        let mut app = app_in(&dir);
        let a = filled_form().to_account().unwrap();
        let b = filled_form().to_account().unwrap();
        app.commit_account(a.clone()).unwrap();
        app.commit_account(b.clone()).unwrap();

        app.remove_account(&a.id).unwrap();
        assert_eq!(app.active_account().map(|x| x.id.clone()), Some(b.id));
    }

    #[rstest]
    fn test_stale_fetch_is_ignored(dir: TempDir) {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = app_in(&dir);
        app.commit_account(filled_form().to_account().unwrap()).unwrap();
        app.folder = FolderKey::Sent;

        let id = app.accounts[0].id.clone();
        app.apply(
            AppMsg::Fetched {
                account_id: id,
                folder: FolderKey::Inbox,
                outcome: FetchOutcome { success: false, messages: vec![], error: Some("x".into()) },
            },
            &tx,
        );
        assert!(!app.status.contains("Fetch error"));
    }

    #[rstest]
    fn test_compose_body_joins_quote() {
        let c = ComposeState {
            to: String::new(),
            subject: String::new(),
            body: "thanks  \n".into(),
            quote: "> hi".into(),
            focus: ComposeField::Body,
        };
        assert_eq!(compose_full_body(&c), "thanks\n\n> hi");
    }
}
