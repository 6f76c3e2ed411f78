//! The dashboard controller.
//!
//! [`Dashboard`] owns every piece of screen state and is the only thing that
//! changes it. Each public async method is one user-visible transition: it
//! runs its requests, folds the outcome into [`DashboardState`] and never
//! returns a network error to the caller.

use chrono::{Local, NaiveDate};
use tracing::{debug, info, warn};

use crate::{
    backend::WeatherBackend,
    error::{DashboardError, Result},
    export::{ExportFile, ExportFormat, export_snapshot},
    geolocation::{self, Coordinates, GeoOptions, Geolocator, LocationErrorKind},
    maps::{HeadlessScriptHost, MapsLoader, ScriptHost},
    model::{LocationQuery, SearchForm, SearchHistoryEntry, SearchUpdate, WeatherSnapshot},
};

pub const FETCH_WEATHER_FAILED: &str = "Failed to fetch weather data";
pub const FETCH_RECORD_FAILED: &str = "Failed to fetch search record";
pub const RECORD_WITHOUT_DATA: &str = "Search record has no weather data";
pub const DELETE_ONE_PROMPT: &str = "Are you sure you want to delete this search record?";

/// The primary view. Exactly one is on screen at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    Loading,
    LocationError(String),
    DataError(String),
    Ready(Box<ReadyView>),
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReadyView {
    pub snapshot: WeatherSnapshot,
    /// Shown for a past or future date rather than "now".
    pub historical: bool,
}

#[derive(Debug, Clone)]
pub struct DashboardState {
    view: View,
    acquiring_location: bool,
    history: Vec<SearchHistoryEntry>,
    history_loading: bool,
    search_dialog_open: bool,
    history_panel_open: bool,
    search_form: SearchForm,
    form_error: Option<String>,
    maps_api_key: Option<String>,
    maps_loaded: bool,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            view: View::Loading,
            acquiring_location: false,
            history: Vec::new(),
            history_loading: false,
            search_dialog_open: false,
            history_panel_open: false,
            search_form: SearchForm::default(),
            form_error: None,
            maps_api_key: None,
            maps_loaded: false,
        }
    }
}

impl DashboardState {
    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.view, View::Loading)
    }

    pub fn loading_message(&self) -> &'static str {
        if self.acquiring_location {
            "Getting your location..."
        } else {
            "Loading weather data..."
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.view {
            View::LocationError(msg) | View::DataError(msg) => Some(msg),
            _ => None,
        }
    }

    pub fn ready(&self) -> Option<&ReadyView> {
        match &self.view {
            View::Ready(ready) => Some(ready),
            _ => None,
        }
    }

    pub fn snapshot(&self) -> Option<&WeatherSnapshot> {
        self.ready().map(|ready| &ready.snapshot)
    }

    pub fn acquiring_location(&self) -> bool {
        self.acquiring_location
    }

    pub fn history(&self) -> &[SearchHistoryEntry] {
        &self.history
    }

    pub fn history_loading(&self) -> bool {
        self.history_loading
    }

    pub fn search_dialog_open(&self) -> bool {
        self.search_dialog_open
    }

    pub fn history_panel_open(&self) -> bool {
        self.history_panel_open
    }

    pub fn search_form(&self) -> &SearchForm {
        &self.search_form
    }

    pub fn form_error(&self) -> Option<&str> {
        self.form_error.as_deref()
    }

    pub fn maps_api_key(&self) -> Option<&str> {
        self.maps_api_key.as_deref()
    }

    pub fn maps_loaded(&self) -> bool {
        self.maps_loaded
    }
}

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

#[derive(Debug)]
pub struct Dashboard {
    backend: Box<dyn WeatherBackend>,
    geolocator: Box<dyn Geolocator>,
    script_host: Box<dyn ScriptHost>,
    geo_options: GeoOptions,
    maps: MapsLoader,
    today: fn() -> NaiveDate,
    state: DashboardState,
}

impl Dashboard {
    pub fn new(backend: Box<dyn WeatherBackend>, geolocator: Box<dyn Geolocator>) -> Self {
        Self {
            backend,
            geolocator,
            script_host: Box::new(HeadlessScriptHost::new()),
            geo_options: GeoOptions::default(),
            maps: MapsLoader::new(),
            today: local_today,
            state: DashboardState::default(),
        }
    }

    pub fn with_script_host(mut self, host: Box<dyn ScriptHost>) -> Self {
        self.script_host = host;
        self
    }

    pub fn with_geo_options(mut self, options: GeoOptions) -> Self {
        self.geo_options = options;
        self
    }

    /// Replace the clock deciding which searches count as "today".
    pub fn with_clock(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn script_host(&self) -> &dyn ScriptHost {
        self.script_host.as_ref()
    }

    /// First load: history and device position are requested together.
    pub async fn mount(&mut self) {
        info!("loading dashboard");
        self.state.view = View::Loading;
        self.state.acquiring_location = true;
        self.state.history_loading = true;

        // Disjoint borrows: neither future touches `state`.
        let (history, position) = tokio::join!(
            self.backend.list_searches(),
            geolocation::acquire(self.geolocator.as_ref(), &self.geo_options),
        );

        self.apply_history(history);
        self.apply_position(position).await;
    }

    /// "Use my location": close the search dialog and locate again.
    pub async fn use_my_location(&mut self) {
        self.state.search_dialog_open = false;
        self.state.view = View::Loading;
        self.state.acquiring_location = true;

        let position = geolocation::acquire(self.geolocator.as_ref(), &self.geo_options).await;
        self.apply_position(position).await;
    }

    async fn apply_position(&mut self, position: Result<Coordinates, LocationErrorKind>) {
        match position {
            Ok(coords) => {
                self.load_by_coordinates(coords).await;
                self.state.acquiring_location = false;
            }
            Err(kind) => {
                warn!(?kind, "could not determine device position");
                self.state.acquiring_location = false;
                self.state.view = View::LocationError(kind.message().to_string());
            }
        }
    }

    async fn load_by_coordinates(&mut self, coords: Coordinates) {
        self.state.view = View::Loading;

        match self.backend.weather_by_coordinates(coords).await {
            Ok(snapshot) => {
                self.adopt_snapshot(snapshot, false).await;
                self.refresh_history().await;
            }
            Err(err) => self.fail_data(&err, FETCH_WEATHER_FAILED),
        }
    }

    /// Submit the manual search form.
    ///
    /// An incomplete form only sets the inline error; no request is made.
    pub async fn submit_search(&mut self, form: SearchForm) {
        let query = match form.validate() {
            Ok(query) => query,
            Err(err) => {
                debug!(%err, "search form rejected");
                self.state.search_form = form;
                self.state.form_error = Some(err.user_message(FETCH_WEATHER_FAILED));
                self.state.search_dialog_open = true;
                return;
            }
        };

        self.state.search_form = form;
        self.state.form_error = None;
        self.state.search_dialog_open = false;
        self.search_location(query).await;
    }

    async fn search_location(&mut self, query: LocationQuery) {
        self.state.view = View::Loading;

        match self.backend.weather_by_location(&query).await {
            Ok(snapshot) => {
                let historical = query.is_historical((self.today)());
                self.adopt_snapshot(snapshot, historical).await;

                // A dated search for another day leaves the history list as it is.
                if !historical {
                    self.refresh_history().await;
                }
            }
            Err(err) => self.fail_data(&err, FETCH_WEATHER_FAILED),
        }
    }

    pub async fn view_history_item(&mut self, id: &str) {
        self.state.view = View::Loading;

        match self.backend.get_search(id).await {
            Ok(record) => match record.weather_data {
                Some(snapshot) => {
                    self.adopt_snapshot(snapshot, record.is_historical).await;
                    self.state.history_panel_open = false;
                }
                None => {
                    warn!(id, "search record has no weather data");
                    self.state.view = View::DataError(RECORD_WITHOUT_DATA.to_string());
                }
            },
            Err(err) => self.fail_data(&err, FETCH_RECORD_FAILED),
        }
    }

    /// Pre-fill the search dialog from a history entry and open it.
    pub fn edit_history_item(&mut self, entry: &SearchHistoryEntry) {
        self.state.search_form = SearchForm::from_entry(entry);
        self.state.form_error = None;
        self.state.history_panel_open = false;
        self.state.search_dialog_open = true;
    }

    /// Delete one record after `confirm` agrees. Returns whether a delete was sent.
    pub async fn delete_history_item(&mut self, id: &str, confirm: impl FnOnce(&str) -> bool) -> bool {
        if !confirm(DELETE_ONE_PROMPT) {
            return false;
        }

        if let Err(err) = self.backend.delete_search(id).await {
            warn!(id, %err, "failed to delete search record");
        }
        self.refresh_history().await;
        true
    }

    /// Delete several records one after another, then refresh once.
    pub async fn delete_history_items(
        &mut self,
        ids: &[String],
        confirm: impl FnOnce(&str) -> bool,
    ) -> bool {
        if ids.is_empty() {
            return false;
        }

        let prompt = format!("Are you sure you want to delete {} search records?", ids.len());
        if !confirm(&prompt) {
            return false;
        }

        self.state.history_loading = true;
        for id in ids {
            if let Err(err) = self.backend.delete_search(id).await {
                warn!(id = %id, %err, "failed to delete search record");
            }
        }
        self.refresh_history().await;
        true
    }

    /// Rename the place stored in a history record, then refresh the list.
    pub async fn update_history_item(
        &mut self,
        id: &str,
        update: &SearchUpdate,
    ) -> Result<SearchHistoryEntry> {
        update.validate()?;

        let result = self.backend.update_search(id, update).await;
        if let Err(err) = &result {
            warn!(id, %err, "failed to update search record");
        }
        self.refresh_history().await;
        result
    }

    pub async fn refresh_history(&mut self) {
        self.state.history_loading = true;
        let history = self.backend.list_searches().await;
        self.apply_history(history);
    }

    fn apply_history(&mut self, history: Result<Vec<SearchHistoryEntry>>) {
        match history {
            Ok(entries) => {
                debug!(count = entries.len(), "search history loaded");
                self.state.history = entries;
            }
            Err(err) => warn!(%err, "failed to fetch search history"),
        }
        self.state.history_loading = false;
    }

    /// Export the snapshot on screen. `None` when no snapshot is shown.
    pub fn export(&self, format: ExportFormat) -> Result<Option<ExportFile>> {
        let Some(snapshot) = self.state.snapshot() else {
            return Ok(None);
        };
        export_snapshot(snapshot, format, (self.today)()).map(Some)
    }

    pub fn dismiss_error(&mut self) {
        if self.state.error_message().is_some() {
            self.state.view = View::Empty;
        }
    }

    pub fn open_search_dialog(&mut self) {
        self.state.search_form = SearchForm::default();
        self.state.form_error = None;
        self.state.search_dialog_open = true;
    }

    pub fn close_search_dialog(&mut self) {
        self.state.search_dialog_open = false;
        self.state.form_error = None;
    }

    pub fn open_history_panel(&mut self) {
        self.state.history_panel_open = true;
    }

    pub fn close_history_panel(&mut self) {
        self.state.history_panel_open = false;
    }

    async fn adopt_snapshot(&mut self, snapshot: WeatherSnapshot, historical: bool) {
        info!(location = %snapshot.location.name, historical, "weather snapshot loaded");

        if let Some(key) = snapshot.maps_key() {
            self.state.maps_api_key = Some(key.to_string());
        }
        self.state.view = View::Ready(Box::new(ReadyView { snapshot, historical }));
        self.load_maps().await;
    }

    async fn load_maps(&mut self) {
        let Some(key) = self.state.maps_api_key.as_deref() else {
            return;
        };
        if self.maps.is_loaded() {
            return;
        }

        let loaded = self.maps.ensure_loaded(self.script_host.as_ref(), key).await;
        match loaded {
            Ok(()) => self.state.maps_loaded = true,
            Err(err) => warn!(%err, "maps script not loaded"),
        }
    }

    fn fail_data(&mut self, err: &DashboardError, fallback: &str) {
        warn!(%err, "weather request failed");
        self.state.view = View::DataError(err.user_message(fallback));
    }
}
