use anyhow::{bail, Context};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use shared_types::{
    expand, format_pattern, AuthUserResponse, CalendarResponse, CreateShiftRequest,
    CreateStudySessionRequest, CreateWorkplaceRequest, ErrorResponse, LoginRequest,
    NextOccurrenceResponse, Occurrence, RecurrenceDefinition, RecurrencePattern, Shift,
    StudySession, Workplace, DEFAULT_MAX_INSTANCES,
};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "shiftsync-cli")]
#[command(about = "CLI for managing shifts, workplaces and study sessions via the ShiftSync API")]
#[command(
    long_about = "A command-line interface for the ShiftSync backend.\n\n\
    Log in once, export the printed token as SHIFTSYNC_TOKEN, then manage\n\
    workplaces, shifts and study sessions. The `expand` command previews a\n\
    recurrence locally without contacting the server."
)]
struct Cli {
    /// Backend server URL to connect to.
    #[arg(
        short,
        long,
        default_value = "http://localhost:3000",
        env = "SHIFTSYNC_API_URL"
    )]
    base_url: String,

    /// Bearer token from `login`.
    #[arg(short, long, env = "SHIFTSYNC_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and print a bearer token
    Login {
        email: String,

        #[arg(long, env = "SHIFTSYNC_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Manage workplaces
    Workplaces {
        #[command(subcommand)]
        action: WorkplaceAction,
    },
    /// Manage shifts
    Shifts {
        #[command(subcommand)]
        action: ShiftAction,
    },
    /// Manage study sessions
    Sessions {
        #[command(subcommand)]
        action: SessionAction,
    },
    /// Show calendar entries, the current week by default
    Calendar {
        /// Window start (RFC 3339)
        #[arg(long)]
        from: Option<DateTime<Utc>>,

        /// Window end (RFC 3339)
        #[arg(long)]
        to: Option<DateTime<Utc>>,
    },
    /// Expand a recurrence locally and print its occurrences
    Expand {
        #[command(flatten)]
        schedule: ScheduleArgs,

        /// Maximum number of occurrences to print
        #[arg(short, long, default_value_t = DEFAULT_MAX_INSTANCES)]
        max: usize,
    },
}

/// Start, end and optional recurrence of an entry.
#[derive(clap::Args, Debug, Clone)]
struct ScheduleArgs {
    /// First occurrence start (RFC 3339, e.g. 2024-01-01T10:00:00Z)
    #[arg(long)]
    start: DateTime<Utc>,

    /// First occurrence end (RFC 3339)
    #[arg(long)]
    end: DateTime<Utc>,

    /// daily, weekly or monthly. Omit for a one-off entry.
    #[arg(short, long, value_name = "PATTERN")]
    repeat: Option<RecurrencePattern>,

    /// Last day (inclusive) an occurrence may start on
    #[arg(long, value_name = "YYYY-MM-DD")]
    until: Option<NaiveDate>,
}

impl ScheduleArgs {
    fn definition(&self) -> RecurrenceDefinition {
        RecurrenceDefinition {
            start_datetime: self.start,
            end_datetime: self.end,
            is_recurring: self.repeat.is_some(),
            recurrence_pattern: self.repeat,
            recurrence_end_date: self.until,
        }
    }
}

#[derive(Subcommand)]
enum WorkplaceAction {
    /// List workplaces
    List,
    /// Create a workplace
    Create {
        name: String,

        /// Hourly rate in cents
        #[arg(short, long, value_name = "CENTS")]
        rate: Option<i32>,

        /// Color in hex format (e.g., "#ff0000")
        #[arg(short, long, value_name = "HEX")]
        color: Option<String>,

        #[arg(short, long)]
        address: Option<String>,
    },
    /// Delete a workplace and all of its shifts
    Delete { id: Uuid },
}

#[derive(Subcommand)]
enum ShiftAction {
    /// List shifts, optionally for one workplace
    List {
        #[arg(short, long)]
        workplace: Option<Uuid>,
    },
    /// Create a shift
    Create {
        /// Workplace UUID. Use 'workplaces list' to find it.
        workplace: Uuid,

        #[command(flatten)]
        schedule: ScheduleArgs,

        #[arg(short, long)]
        title: Option<String>,

        #[arg(short, long)]
        notes: Option<String>,
    },
    /// Delete a shift
    Delete { id: Uuid },
    /// Show the next occurrence of a shift
    Next {
        id: Uuid,

        /// Reference time (RFC 3339); defaults to now
        #[arg(long)]
        now: Option<DateTime<Utc>>,
    },
}

#[derive(Subcommand)]
enum SessionAction {
    /// List study sessions
    List,
    /// Create a study session
    Create {
        subject: String,

        #[command(flatten)]
        schedule: ScheduleArgs,

        #[arg(short, long)]
        location: Option<String>,

        #[arg(short, long)]
        notes: Option<String>,
    },
    /// Delete a study session
    Delete { id: Uuid },
}

/// Thin authenticated wrapper over the REST API.
struct Api {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl Api {
    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url.trim_end_matches('/'), path)
    }

    fn authed(&self, request: RequestBuilder) -> anyhow::Result<RequestBuilder> {
        match &self.token {
            Some(token) => Ok(request.bearer_auth(token)),
            None => bail!("not logged in: run `shiftsync-cli login` and set SHIFTSYNC_TOKEN"),
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> anyhow::Result<T> {
        let response = self.authed(request)?.send().await.context("request failed")?;
        read_json(response).await
    }

    async fn delete(&self, path: &str) -> anyhow::Result<()> {
        let response = self
            .authed(self.client.delete(self.url(path)))?
            .send()
            .await
            .context("request failed")?;
        if !response.status().is_success() {
            bail!(error_message(response).await);
        }
        Ok(())
    }
}

async fn error_message(response: reqwest::Response) -> String {
    let status = response.status();
    match response.json::<ErrorResponse>().await {
        Ok(body) => match body.details {
            Some(details) => format!("{} ({}): {}", body.error, status, details),
            None => format!("{} ({})", body.error, status),
        },
        Err(_) => format!("request failed with status {}", status),
    }
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> anyhow::Result<T> {
    if !response.status().is_success() {
        bail!(error_message(response).await);
    }
    response.json().await.context("invalid response body")
}

fn short_id(id: Uuid) -> String {
    id.to_string()[..8].to_string()
}

fn format_occurrence(occurrence: &Occurrence) -> String {
    format!(
        "{} → {}",
        occurrence.start_datetime.format("%a %Y-%m-%d %H:%M"),
        occurrence.end_datetime.format("%a %Y-%m-%d %H:%M")
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let api = Api {
        client: Client::new(),
        base_url: cli.base_url,
        token: cli.token,
    };

    match cli.command {
        Commands::Login { email, password } => login(&api, email, password).await?,
        Commands::Workplaces { action } => handle_workplaces(&api, action).await?,
        Commands::Shifts { action } => handle_shifts(&api, action).await?,
        Commands::Sessions { action } => handle_sessions(&api, action).await?,
        Commands::Calendar { from, to } => show_calendar(&api, from, to).await?,
        Commands::Expand { schedule, max } => {
            for line in expand_lines(&schedule.definition(), max) {
                println!("{}", line);
            }
        }
    }

    Ok(())
}

async fn login(api: &Api, email: String, password: String) -> anyhow::Result<()> {
    let response = api
        .client
        .post(api.url("/auth/login"))
        .json(&LoginRequest { email, password })
        .send()
        .await
        .context("request failed")?;
    let user: AuthUserResponse = read_json(response).await?;

    println!("Logged in as {}", user.email);
    match user.token {
        Some(token) => println!("export SHIFTSYNC_TOKEN={}", token),
        None => println!("Server did not return a bearer token"),
    }
    Ok(())
}

async fn handle_workplaces(api: &Api, action: WorkplaceAction) -> anyhow::Result<()> {
    match action {
        WorkplaceAction::List => {
            let workplaces: Vec<Workplace> = api.send(api.client.get(api.url("/workplaces"))).await?;
            if workplaces.is_empty() {
                println!("No workplaces found.");
            }
            for w in workplaces {
                let rate = w
                    .hourly_rate_cents
                    .map(|c| format!("{}.{:02}/h", c / 100, c % 100))
                    .unwrap_or_else(|| "no rate".to_string());
                println!("[{}] {} ({})", short_id(w.id), w.name, rate);
            }
        }
        WorkplaceAction::Create {
            name,
            rate,
            color,
            address,
        } => {
            let req = CreateWorkplaceRequest {
                name,
                hourly_rate_cents: rate,
                color,
                address,
            };
            let w: Workplace = api
                .send(api.client.post(api.url("/workplaces")).json(&req))
                .await?;
            println!("Created workplace: [{}] {}", short_id(w.id), w.name);
        }
        WorkplaceAction::Delete { id } => {
            api.delete(&format!("/workplaces/{}", id)).await?;
            println!("Deleted workplace: {}", id);
        }
    }
    Ok(())
}

async fn handle_shifts(api: &Api, action: ShiftAction) -> anyhow::Result<()> {
    match action {
        ShiftAction::List { workplace } => {
            let mut request = api.client.get(api.url("/shifts"));
            if let Some(workplace_id) = workplace {
                request = request.query(&[("workplace_id", workplace_id.to_string())]);
            }
            let shifts: Vec<Shift> = api.send(request).await?;
            if shifts.is_empty() {
                println!("No shifts found.");
            }
            for s in shifts {
                println!(
                    "[{}] {} {} ({})",
                    short_id(s.id),
                    s.title.as_deref().unwrap_or("Shift"),
                    s.start_datetime.format("%Y-%m-%d %H:%M"),
                    format_pattern(s.recurrence_pattern.filter(|_| s.is_recurring))
                );
            }
        }
        ShiftAction::Create {
            workplace,
            schedule,
            title,
            notes,
        } => {
            let req = CreateShiftRequest {
                workplace_id: workplace,
                title,
                start_datetime: schedule.start,
                end_datetime: schedule.end,
                is_recurring: schedule.repeat.is_some(),
                recurrence_pattern: schedule.repeat,
                recurrence_end_date: schedule.until,
                notes,
            };
            let s: Shift = api.send(api.client.post(api.url("/shifts")).json(&req)).await?;
            println!("Created shift: [{}]", short_id(s.id));
        }
        ShiftAction::Delete { id } => {
            api.delete(&format!("/shifts/{}", id)).await?;
            println!("Deleted shift: {}", id);
        }
        ShiftAction::Next { id, now } => {
            let mut request = api.client.get(api.url(&format!("/shifts/{}/next", id)));
            if let Some(now) = now {
                request = request.query(&[("now", now.to_rfc3339())]);
            }
            let next: NextOccurrenceResponse = api.send(request).await?;
            match next.occurrence {
                Some(o) => println!("Next: {}", format_occurrence(&o)),
                None => println!("No upcoming occurrence."),
            }
        }
    }
    Ok(())
}

async fn handle_sessions(api: &Api, action: SessionAction) -> anyhow::Result<()> {
    match action {
        SessionAction::List => {
            let sessions: Vec<StudySession> =
                api.send(api.client.get(api.url("/study-sessions"))).await?;
            if sessions.is_empty() {
                println!("No study sessions found.");
            }
            for s in sessions {
                println!(
                    "[{}] {} {} ({})",
                    short_id(s.id),
                    s.subject,
                    s.start_datetime.format("%Y-%m-%d %H:%M"),
                    format_pattern(s.recurrence_pattern.filter(|_| s.is_recurring))
                );
            }
        }
        SessionAction::Create {
            subject,
            schedule,
            location,
            notes,
        } => {
            let req = CreateStudySessionRequest {
                subject,
                location,
                start_datetime: schedule.start,
                end_datetime: schedule.end,
                is_recurring: schedule.repeat.is_some(),
                recurrence_pattern: schedule.repeat,
                recurrence_end_date: schedule.until,
                notes,
            };
            let s: StudySession = api
                .send(api.client.post(api.url("/study-sessions")).json(&req))
                .await?;
            println!("Created study session: [{}] {}", short_id(s.id), s.subject);
        }
        SessionAction::Delete { id } => {
            api.delete(&format!("/study-sessions/{}", id)).await?;
            println!("Deleted study session: {}", id);
        }
    }
    Ok(())
}

async fn show_calendar(
    api: &Api,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> anyhow::Result<()> {
    let mut params = Vec::new();
    if let Some(from) = from {
        params.push(("from", from.to_rfc3339()));
    }
    if let Some(to) = to {
        params.push(("to", to.to_rfc3339()));
    }
    let calendar: CalendarResponse = api
        .send(api.client.get(api.url("/calendar")).query(&params))
        .await?;

    println!(
        "{} to {}",
        calendar.from.format("%Y-%m-%d"),
        calendar.to.format("%Y-%m-%d")
    );
    let mut current_day = None;
    for entry in calendar.entries {
        let day = entry.start_datetime.date_naive();
        if current_day != Some(day) {
            println!("\n{}", day.format("%A %Y-%m-%d"));
            current_day = Some(day);
        }
        println!(
            "  {}-{} [{}] {}",
            entry.start_datetime.format("%H:%M"),
            entry.end_datetime.format("%H:%M"),
            entry.kind.as_str(),
            entry.title
        );
    }
    Ok(())
}

fn expand_lines(definition: &RecurrenceDefinition, max: usize) -> Vec<String> {
    let occurrences = expand(definition, max);
    let mut lines = vec![format!(
        "{}: {} occurrence(s)",
        format_pattern(definition.cadence()),
        occurrences.len()
    )];
    lines.extend(occurrences.iter().map(format_occurrence));
    lines
}
