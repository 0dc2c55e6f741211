//! Skybook CLI - terminal front end for the flight booking platform
//!
//! Wires the session manager, gateway, and notification channel together the
//! way the browser client did, with subcommands standing in for views.

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use skybook_app::{
    AuthManager, AuthState, FeedUpdate, FileSessionStore, NotificationChannel, RouteDecision,
    RouteGuard,
};
use skybook_client::{
    ApiGateway, AuthApi, BookingCreate, BookingsApi, FlightCreate, FlightUpdate, FlightsApi,
    GatewayConfig, LocationCreate, LocationsApi, NotificationsApi, ProfileUpdate, RegisterRequest,
};
use skybook_core::{
    init_logging, FlightStatus, LoggingConfig, Passenger, Role, SkybookConfig, UserRecord,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "skybook")]
#[command(about = "Terminal client for the flight booking platform")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and persist the session
    Login {
        email: String,
        password: String,
    },

    /// Log out and clear the persisted session
    Logout,

    /// Show the authenticated user
    Whoami,

    /// Register a new account
    Register {
        first_name: String,
        last_name: String,
        email: String,
        password: String,
    },

    /// Show or update the authenticated user's profile
    Profile {
        #[arg(long)]
        first_name: Option<String>,

        #[arg(long)]
        last_name: Option<String>,
    },

    /// Browse and manage flights
    Flights {
        #[command(subcommand)]
        command: FlightCommands,
    },

    /// Browse and manage locations
    Locations {
        #[command(subcommand)]
        command: LocationCommands,
    },

    /// Book flights and review bookings
    Bookings {
        #[command(subcommand)]
        command: BookingCommands,
    },

    /// Notification feed
    Notifications {
        #[command(subcommand)]
        command: NotificationCommands,
    },

    /// Manage configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Write a default configuration file
        #[arg(long)]
        init: bool,

        /// Validate current configuration
        #[arg(long)]
        validate: bool,
    },
}

#[derive(Subcommand)]
enum FlightCommands {
    /// List flights, optionally filtered by airport codes
    List {
        /// Departure airport code
        #[arg(long)]
        from: Option<String>,

        /// Arrival airport code
        #[arg(long)]
        to: Option<String>,
    },

    /// Show a single flight
    Show { id: Uuid },

    /// Add a flight (administrators only)
    Add {
        flight_number: String,

        /// Departure airport code
        #[arg(long)]
        from: String,

        /// Arrival airport code
        #[arg(long)]
        to: String,

        /// Departure time (RFC 3339)
        #[arg(long)]
        departs: String,

        /// Arrival time (RFC 3339)
        #[arg(long)]
        arrives: String,

        #[arg(long)]
        seats: i64,

        /// Ticket price, e.g. 199.99
        #[arg(long)]
        price: String,
    },

    /// Update a flight (administrators only)
    Update {
        id: Uuid,

        #[arg(long)]
        price: Option<String>,

        #[arg(long)]
        status: Option<String>,

        #[arg(long)]
        available_seats: Option<i64>,
    },

    /// Delete a flight (administrators only)
    Delete { id: Uuid },
}

#[derive(Subcommand)]
enum LocationCommands {
    /// List all locations
    List,

    /// Add a location (administrators only)
    Add {
        name: String,

        /// Airport code, e.g. LIS
        #[arg(long)]
        code: String,

        #[arg(long)]
        city: String,

        #[arg(long)]
        country: String,
    },

    /// Delete a location (administrators only)
    Delete { id: Uuid },
}

#[derive(Subcommand)]
enum BookingCommands {
    /// List bookings visible to the current account
    List,

    /// Book a flight
    Book {
        flight_id: Uuid,

        /// Passenger as "First:Last" or "First:Last:email", repeatable
        #[arg(long = "passenger")]
        passengers: Vec<String>,
    },

    /// Cancel a booking
    Cancel { id: Uuid },
}

#[derive(Subcommand)]
enum NotificationCommands {
    /// Show recent notifications and the unread count
    Show,

    /// Mark everything visible as read
    Read,

    /// Stream push notifications until interrupted
    Watch,
}

/// Wired-up application: store, gateway, session manager
struct App {
    config: SkybookConfig,
    gateway: Arc<ApiGateway>,
    manager: Arc<AuthManager>,
}

impl App {
    fn build(config_path: Option<&PathBuf>) -> anyhow::Result<Self> {
        let config = load_config(config_path)?;

        let session_path = expand_home(&config.storage.session_file);
        let store = Arc::new(FileSessionStore::new(session_path)?);

        let gateway = Arc::new(ApiGateway::new(
            GatewayConfig::from_config(&config),
            store.clone(),
        )?);
        let auth_api = Arc::new(AuthApi::new(gateway.clone()));
        let manager = Arc::new(AuthManager::new(store, auth_api));

        // Forced expiry from the gateway flows back into the state machine
        let _ = manager.watch_session_events(gateway.subscribe_session_events());

        Ok(Self {
            config,
            gateway,
            manager,
        })
    }

    /// Hydrate and return the terminal auth state
    fn hydrated(&self) -> AuthState {
        self.manager.hydrate()
    }

    /// Gate an admin-only command the same way the views are gated
    fn ensure_admin(&self) -> anyhow::Result<()> {
        let guard = RouteGuard::allow_roles([Role::Admin]);
        match guard.evaluate(&self.manager.state(), "/admin") {
            RouteDecision::Grant => Ok(()),
            RouteDecision::RedirectToLogin { .. } => {
                bail!("not logged in; run `skybook login` first")
            }
            RouteDecision::RedirectToDefault => {
                bail!("this command requires an administrator account")
            }
            RouteDecision::Pending => bail!("session is still hydrating"),
        }
    }

    /// The authenticated user and access token, or an error telling the user
    /// to log in
    fn require_session(&self) -> anyhow::Result<(UserRecord, String)> {
        match self.manager.state() {
            AuthState::Authenticated { user, access_token } => Ok((user, access_token)),
            _ => bail!("not logged in; run `skybook login` first"),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut logging_config = LoggingConfig::default();
    if cli.verbose {
        logging_config.level = "debug".to_string();
    } else {
        logging_config.level = "warn".to_string();
    }
    init_logging(&logging_config).map_err(|e| anyhow!("failed to initialize logging: {}", e))?;

    info!("Starting Skybook CLI v{}", env!("CARGO_PKG_VERSION"));

    if let Commands::Config {
        show,
        init,
        validate,
    } = &cli.command
    {
        return handle_config(cli.config.as_ref(), *show, *init, *validate);
    }

    let app = App::build(cli.config.as_ref())?;
    app.hydrated();

    match cli.command {
        Commands::Login { email, password } => {
            let user = app.manager.login(&email, &password).await?;
            println!("Welcome, {} ({})", user.display_name(), user.role);
        }

        Commands::Logout => {
            app.manager.logout();
            println!("Logged out");
        }

        Commands::Whoami => match app.manager.state() {
            AuthState::Authenticated { user, .. } => {
                println!("{} <{}> [{}]", user.display_name(), user.email, user.role);
            }
            _ => println!("Not logged in"),
        },

        Commands::Register {
            first_name,
            last_name,
            email,
            password,
        } => {
            let auth = AuthApi::new(app.gateway.clone());
            let user = auth
                .register(&RegisterRequest {
                    first_name,
                    last_name,
                    email,
                    password,
                    role: None,
                })
                .await?;
            println!("Registered {} <{}>", user.display_name(), user.email);
        }

        Commands::Profile {
            first_name,
            last_name,
        } => {
            app.require_session()?;
            let auth = AuthApi::new(app.gateway.clone());
            if first_name.is_none() && last_name.is_none() {
                let user = auth.me().await?;
                println!("{} <{}> [{}]", user.display_name(), user.email, user.role);
            } else {
                let user = auth
                    .update_profile(&ProfileUpdate {
                        first_name,
                        last_name,
                    })
                    .await?;
                println!("Profile updated: {}", user.display_name());
            }
        }

        Commands::Flights { command } => handle_flights(&app, command).await?,
        Commands::Locations { command } => handle_locations(&app, command).await?,
        Commands::Bookings { command } => handle_bookings(&app, command).await?,
        Commands::Notifications { command } => handle_notifications(&app, command).await?,

        Commands::Config { .. } => unreachable!("handled above"),
    }

    Ok(())
}

async fn handle_flights(app: &App, command: FlightCommands) -> anyhow::Result<()> {
    let flights = FlightsApi::new(app.gateway.clone());

    match command {
        FlightCommands::List { from, to } => {
            let mut params = Vec::new();
            if let Some(from) = from {
                params.push(("departure".to_string(), from));
            }
            if let Some(to) = to {
                params.push(("arrival".to_string(), to));
            }

            let listed = if params.is_empty() {
                flights.list().await?
            } else {
                flights.search(params).await?
            };

            for flight in listed {
                println!(
                    "{}  {}  {} -> {}  {}  {} seats  {} EUR  [{:?}]",
                    flight.flight_id,
                    flight.flight_number,
                    flight.departure_location.airport_code,
                    flight.arrival_location.airport_code,
                    flight.departure_time.to_rfc3339(),
                    flight.available_seats,
                    flight.price,
                    flight.status,
                );
            }
        }

        FlightCommands::Show { id } => {
            let flight = flights.get(id).await?;
            println!("Flight {}", flight.flight_number);
            println!(
                "  {} ({}) -> {} ({})",
                flight.departure_location.name,
                flight.departure_location.airport_code,
                flight.arrival_location.name,
                flight.arrival_location.airport_code,
            );
            println!(
                "  departs {}  arrives {}",
                flight.departure_time.to_rfc3339(),
                flight.arrival_time.to_rfc3339()
            );
            println!(
                "  {}/{} seats available, {} EUR, status {:?}",
                flight.available_seats, flight.total_seats, flight.price, flight.status
            );
        }

        FlightCommands::Add {
            flight_number,
            from,
            to,
            departs,
            arrives,
            seats,
            price,
        } => {
            app.ensure_admin()?;
            let flight = flights
                .create(&FlightCreate {
                    flight_number,
                    departure_location: from,
                    arrival_location: to,
                    departure_time: parse_time(&departs)?,
                    arrival_time: parse_time(&arrives)?,
                    total_seats: seats,
                    available_seats: seats,
                    price,
                })
                .await?;
            println!("Created flight {} ({})", flight.flight_number, flight.flight_id);
        }

        FlightCommands::Update {
            id,
            price,
            status,
            available_seats,
        } => {
            app.ensure_admin()?;
            let status = status.map(|s| parse_status(&s)).transpose()?;
            let flight = flights
                .update(
                    id,
                    &FlightUpdate {
                        price,
                        status,
                        available_seats,
                        ..Default::default()
                    },
                )
                .await?;
            println!("Updated flight {} ({:?})", flight.flight_number, flight.status);
        }

        FlightCommands::Delete { id } => {
            app.ensure_admin()?;
            flights.delete(id).await?;
            println!("Deleted flight {}", id);
        }
    }

    Ok(())
}

async fn handle_locations(app: &App, command: LocationCommands) -> anyhow::Result<()> {
    let locations = LocationsApi::new(app.gateway.clone());

    match command {
        LocationCommands::List => {
            for location in locations.list().await? {
                println!(
                    "{}  {}  {} ({}, {})",
                    location.location_id,
                    location.airport_code,
                    location.name,
                    location.city,
                    location.country
                );
            }
        }

        LocationCommands::Add {
            name,
            code,
            city,
            country,
        } => {
            app.ensure_admin()?;
            let location = locations
                .create(&LocationCreate {
                    name,
                    airport_code: code,
                    city,
                    country,
                })
                .await?;
            println!("Created location {} ({})", location.airport_code, location.location_id);
        }

        LocationCommands::Delete { id } => {
            app.ensure_admin()?;
            locations.delete(id).await?;
            println!("Deleted location {}", id);
        }
    }

    Ok(())
}

async fn handle_bookings(app: &App, command: BookingCommands) -> anyhow::Result<()> {
    let bookings = BookingsApi::new(app.gateway.clone());

    match command {
        BookingCommands::List => {
            app.require_session()?;
            for booking in bookings.list().await? {
                println!(
                    "{}  flight {}  {:?}  booked {}  {} passenger(s)",
                    booking.booking_id,
                    booking.flight_id,
                    booking.status,
                    booking.booking_date.to_rfc3339(),
                    booking.passengers_details.len(),
                );
            }
        }

        BookingCommands::Book {
            flight_id,
            passengers,
        } => {
            app.require_session()?;
            let passengers_list = passengers
                .iter()
                .map(|spec| parse_passenger(spec))
                .collect::<anyhow::Result<Vec<_>>>()?;

            let booking = bookings
                .create(&BookingCreate {
                    flight_id,
                    passengers_list,
                })
                .await?;
            println!("Booked: {} ({:?})", booking.booking_id, booking.status);
        }

        BookingCommands::Cancel { id } => {
            app.require_session()?;
            bookings.cancel(id).await?;
            println!("Cancelled booking {}", id);
        }
    }

    Ok(())
}

async fn handle_notifications(app: &App, command: NotificationCommands) -> anyhow::Result<()> {
    let (user, access_token) = app.require_session()?;
    let api = Arc::new(NotificationsApi::new(app.gateway.clone()));

    match command {
        NotificationCommands::Show => {
            let unread = api.unread_count(user.id).await?;
            let page = api.recent(user.id).await?;
            println!("{} unread", unread);
            for notification in page.results {
                let marker = if notification.is_read { " " } else { "*" };
                println!("{} {}  {}", marker, notification.timestamp, notification.message);
            }
        }

        NotificationCommands::Read => {
            let channel =
                NotificationChannel::open(&app.config.websocket, &user, &access_token, api)
                    .await?;
            channel.open_tray().await?;
            let (_, unread) = channel.snapshot().await;
            println!("All visible notifications marked read ({} unread)", unread);
        }

        NotificationCommands::Watch => {
            let mut channel =
                NotificationChannel::open(&app.config.websocket, &user, &access_token, api)
                    .await?;

            let (visible, unread) = channel.snapshot().await;
            println!("{} unread, {} in the window", unread, visible.len());
            println!("Watching for notifications (Ctrl-C to stop)...");

            let mut updates = channel.subscribe();
            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => break,
                    update = updates.recv() => match update {
                        Ok(FeedUpdate::Received(notification)) => {
                            println!("* {}  {}", notification.timestamp, notification.message);
                        }
                        Ok(_) => {}
                        Err(_) => break,
                    },
                }
            }

            channel.close();
        }
    }

    Ok(())
}

fn handle_config(
    path: Option<&PathBuf>,
    show: bool,
    init: bool,
    validate: bool,
) -> anyhow::Result<()> {
    let config_path = path
        .cloned()
        .unwrap_or_else(|| expand_home("~/.skybook/config.toml"));

    if init {
        let config = SkybookConfig::default();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        config.save_to_file(&config_path)?;
        println!("Wrote default configuration to {}", config_path.display());
        return Ok(());
    }

    let config = load_config(Some(&config_path))?;

    if validate {
        config.validate()?;
        println!("Configuration is valid");
    }

    if show || !validate {
        println!("api.base_url       = {}", config.api.base_url);
        println!("websocket.base_url = {}", config.websocket.base_url);
        println!("storage.session_file = {}", config.storage.session_file);
    }

    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<SkybookConfig> {
    let config = match path {
        Some(path) if path.exists() => SkybookConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        _ => SkybookConfig::default(),
    };

    let config = config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}

/// Expand a leading `~` to the home directory
fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    Path::new(path).to_path_buf()
}

fn parse_time(value: &str) -> anyhow::Result<chrono::DateTime<chrono::Utc>> {
    chrono::DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&chrono::Utc))
        .with_context(|| format!("invalid RFC 3339 timestamp: {}", value))
}

fn parse_status(value: &str) -> anyhow::Result<FlightStatus> {
    match value.to_lowercase().as_str() {
        "scheduled" => Ok(FlightStatus::Scheduled),
        "delayed" => Ok(FlightStatus::Delayed),
        "boarding" => Ok(FlightStatus::Boarding),
        "departed" => Ok(FlightStatus::Departed),
        "cancelled" => Ok(FlightStatus::Cancelled),
        other => bail!("unknown flight status: {}", other),
    }
}

/// Parse "First:Last" or "First:Last:email" into a passenger record
fn parse_passenger(spec: &str) -> anyhow::Result<Passenger> {
    let mut parts = spec.splitn(3, ':');
    let first_name = parts.next().filter(|s| !s.is_empty());
    let last_name = parts.next().filter(|s| !s.is_empty());
    let email = parts.next().filter(|s| !s.is_empty());

    match (first_name, last_name) {
        (Some(first), Some(last)) => Ok(Passenger {
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: email.map(String::from),
            passport_number: None,
        }),
        _ => bail!("passenger must be \"First:Last\" or \"First:Last:email\", got {:?}", spec),
    }
}
