//! Dashboard state and the single task allowed to change it.
//!
//! [`Controller`] owns the [`DashboardState`]; every mutation goes through
//! [`Controller::update`], which republishes a snapshot on a `watch` channel
//! for whatever renders the cards.

use std::{fmt::Display, future::Future, sync::Arc, time::Duration};

use chrono::{DateTime, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
    time::MissedTickBehavior,
};
use tracing::{debug, info, warn};

use crate::{
    DashboardError, WeatherData,
    geolocation::Geolocator,
    normalize::{clock_label, date_label, normalize},
    provider::WeatherProvider,
};

/// Interval of the clock refreshing `current.time` / `current.date`.
pub const CLOCK_TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Theme::Dark => "Dark Mode",
            Theme::Light => "Light Mode",
        }
    }
}

/// Everything the view renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardState {
    pub weather: WeatherData,
    pub loading: bool,
    /// Orthogonal to `weather`: an error never clears the last good record.
    pub error: Option<String>,
    pub search: String,
    pub theme: Theme,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            weather: WeatherData::placeholder(),
            loading: false,
            error: None,
            search: String::new(),
            theme: Theme::default(),
        }
    }
}

/// Inputs accepted by [`Controller::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Search box edited.
    SearchText(String),
    /// Search confirmed.
    Search(String),
    Locate,
    ToggleTheme,
    Quit,
}

type FetchOutcome = Result<WeatherData, DashboardError>;

pub struct Controller<Tz: TimeZone = Local> {
    provider: Arc<dyn WeatherProvider>,
    geolocator: Option<Arc<dyn Geolocator>>,
    tz: Tz,
    state: DashboardState,
    publisher: watch::Sender<DashboardState>,
}

impl Controller<Local> {
    /// Controller labelling times in the system's local zone.
    pub fn new(
        provider: Arc<dyn WeatherProvider>,
        geolocator: Option<Arc<dyn Geolocator>>,
    ) -> Self {
        Self::with_timezone(provider, geolocator, Local)
    }
}

impl<Tz> Controller<Tz>
where
    Tz: TimeZone + Send + Sync + 'static,
    Tz::Offset: Display + Send + Sync,
{
    pub fn with_timezone(
        provider: Arc<dyn WeatherProvider>,
        geolocator: Option<Arc<dyn Geolocator>>,
        tz: Tz,
    ) -> Self {
        let state = DashboardState::default();
        let (publisher, _) = watch::channel(state.clone());
        Self {
            provider,
            geolocator,
            tz,
            state,
            publisher,
        }
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.update(|s| s.theme = theme);
        self
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    /// Receiver that sees every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.publisher.subscribe()
    }

    /// The only place state changes.
    fn update(&mut self, f: impl FnOnce(&mut DashboardState)) {
        f(&mut self.state);
        self.publisher.send_replace(self.state.clone());
    }

    pub fn set_search_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.update(|s| s.search = text);
    }

    pub fn toggle_theme(&mut self) {
        self.update(|s| s.theme = s.theme.toggled());
    }

    /// Refresh `current.time` / `current.date` and nothing else.
    pub fn tick_at(&mut self, now: DateTime<Utc>) {
        let local = now.with_timezone(&self.tz);
        let time = clock_label(&local);
        let date = date_label(&local);
        if self.state.weather.current.time == time && self.state.weather.current.date == date {
            return;
        }
        self.update(|s| {
            s.weather.current.time = time;
            s.weather.current.date = date;
        });
    }

    /// Search-submit: fetch and display the weather for `query`.
    ///
    /// Blank queries are ignored. Failures only set the error message.
    pub async fn search(&mut self, query: &str) {
        if let Some(mut task) = self.start_search(query) {
            let outcome = join(&mut task).await;
            self.finish(outcome);
        }
    }

    /// Locate-me: resolve the current position to a place and search for it.
    pub async fn locate(&mut self) {
        if let Some(mut task) = self.start_locate() {
            let outcome = join(&mut task).await;
            self.finish(outcome);
        }
    }

    /// Drive the dashboard until `Quit`, the event channel closing, or `shutdown`.
    ///
    /// A new search or locate aborts the one still in flight, so only the
    /// latest request ever lands in the state.
    pub async fn run<F>(mut self, mut events: mpsc::Receiver<Event>, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut clock = tokio::time::interval(CLOCK_TICK);
        clock.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut in_flight: Option<JoinHandle<FetchOutcome>> = None;
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = clock.tick() => self.tick_at(Utc::now()),
                outcome = wait_for(&mut in_flight) => {
                    in_flight = None;
                    self.finish(outcome);
                }
                event = events.recv() => match event {
                    None | Some(Event::Quit) => break,
                    Some(Event::SearchText(text)) => self.set_search_text(text),
                    Some(Event::ToggleTheme) => self.toggle_theme(),
                    Some(Event::Search(query)) => {
                        if query.trim().is_empty() {
                            continue;
                        }
                        abort_stale(&mut in_flight);
                        in_flight = self.start_search(&query);
                    }
                    Some(Event::Locate) => {
                        abort_stale(&mut in_flight);
                        in_flight = self.start_locate();
                    }
                },
            }
        }

        abort_stale(&mut in_flight);
        debug!("dashboard loop stopped");
    }

    fn start_search(&mut self, query: &str) -> Option<JoinHandle<FetchOutcome>> {
        let city = query.trim();
        if city.is_empty() {
            return None;
        }
        let city = city.to_string();

        self.update(|s| {
            s.loading = true;
            s.error = None;
            s.search.clear();
        });

        let provider = Arc::clone(&self.provider);
        let tz = self.tz.clone();
        Some(tokio::spawn(fetch_sequence(provider, city, tz)))
    }

    fn start_locate(&mut self) -> Option<JoinHandle<FetchOutcome>> {
        self.update(|s| {
            s.loading = true;
            s.error = None;
        });

        let Some(geolocator) = self.geolocator.clone() else {
            self.finish(Err(DashboardError::GeolocationUnsupported));
            return None;
        };

        let provider = Arc::clone(&self.provider);
        let tz = self.tz.clone();
        Some(tokio::spawn(locate_sequence(provider, geolocator, tz)))
    }

    fn finish(&mut self, outcome: FetchOutcome) {
        match outcome {
            Ok(weather) => {
                info!(location = %weather.current.location, "weather updated");
                self.update(|s| {
                    s.weather = weather;
                    s.loading = false;
                });
            }
            Err(err) => {
                warn!(error = %err.detail(), "weather request failed");
                self.update(|s| {
                    s.error = Some(err.to_string());
                    s.loading = false;
                });
            }
        }
    }
}

/// Current conditions, then the forecast, then normalization.
async fn fetch_sequence<Tz>(
    provider: Arc<dyn WeatherProvider>,
    city: String,
    tz: Tz,
) -> FetchOutcome
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    info!(%city, "fetching weather");
    let current = provider.current_by_city(&city).await?;
    let forecast = provider.forecast_by_city(&city).await?;

    let now = Utc::now().with_timezone(&tz);
    normalize(&current, &forecast, &now)
}

async fn locate_sequence<Tz>(
    provider: Arc<dyn WeatherProvider>,
    geolocator: Arc<dyn Geolocator>,
    tz: Tz,
) -> FetchOutcome
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let coords = geolocator
        .locate()
        .await
        .map_err(|e| DashboardError::GeolocationDenied(e.to_string()))?;
    debug!(?coords, "position acquired");

    let place = provider.current_by_coords(coords).await.map_err(|e| match e {
        DashboardError::LocationLookup(_) => e,
        other => DashboardError::LocationLookup(other.detail()),
    })?;

    fetch_sequence(provider, place.name, tz).await
}

async fn join(task: &mut JoinHandle<FetchOutcome>) -> FetchOutcome {
    task.await
        .unwrap_or_else(|e| Err(DashboardError::NetworkOrParseFailure(e.to_string())))
}

async fn wait_for(slot: &mut Option<JoinHandle<FetchOutcome>>) -> FetchOutcome {
    match slot {
        Some(task) => join(task).await,
        None => std::future::pending().await,
    }
}

fn abort_stale(slot: &mut Option<JoinHandle<FetchOutcome>>) {
    if let Some(task) = slot.take() {
        debug!("aborting stale request");
        task.abort();
    }
}
