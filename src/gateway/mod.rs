// SPDX-License-Identifier: Apache-2.0

//! Query Gateway
//!
//! The façade handed to application code for one client. A gateway owns one
//! connection, one statement under construction, a result cache and the
//! transaction state. The reputation ledger and diagnostic logger are shared
//! with every other gateway of the process.
//!
//! ## Lifecycle
//!
//! 1. Resolve connection settings (explicit layer over session layer)
//! 2. Open the connection through a [`Connector`]
//! 3. Refuse clients whose reputation score reached the threshold
//! 4. `set_query` / `add_param` / `execute`, any number of times

mod cache;
mod executor;
mod request;

pub use cache::{CacheKey, StatementCache};
pub use executor::TransactionState;
pub use request::StatementRequest;

use std::sync::Arc;

use gate_core::{
    parameter_event_message, AddressAsHost, ClientContext, ConnectOptions, ConnectTarget,
    Connection, Connector, EventCode, ExecutionResult, HostResolver, LedgerStore, Value,
};
use gate_sql::build_dsn;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::{DbConfigLayer, GatewayConfig, LogTarget};
use crate::diagnostics::DiagnosticLogger;
use crate::error::{GatewayError, GatewayResult};
use crate::reputation::ReputationLedger;
use crate::validator::ParameterValidator;

/// Process-wide collaborators shared by every gateway
#[derive(Clone)]
pub struct GatewayServices {
    pub ledger: Arc<ReputationLedger>,
    pub diagnostics: Arc<DiagnosticLogger>,
    pub validator: Arc<ParameterValidator>,
    pub resolver: Arc<dyn HostResolver>,
    /// Diagnostic targets a new gateway starts with
    pub log_targets: Vec<LogTarget>,
}

impl GatewayServices {
    pub fn new(ledger: Arc<ReputationLedger>, diagnostics: Arc<DiagnosticLogger>) -> Self {
        Self {
            ledger,
            diagnostics,
            validator: Arc::new(ParameterValidator::new()),
            resolver: Arc::new(AddressAsHost),
            log_targets: vec![LogTarget::File],
        }
    }

    /// Ledger and diagnostics built from `config` on top of `store`. The
    /// `database` log target writes into the same store.
    pub fn from_config(config: &GatewayConfig, store: Arc<dyn LedgerStore>) -> Self {
        let ledger = ReputationLedger::new(
            Arc::clone(&store),
            config.security.error_points_threshold,
        );
        let diagnostics = DiagnosticLogger::from_config(&config.log).with_ledger_store(store);

        let mut services = Self::new(Arc::new(ledger), Arc::new(diagnostics));
        services.log_targets = config.log.targets.clone();
        services
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn HostResolver>) -> Self {
        self.resolver = resolver;
        self
    }
}

pub struct Gateway {
    id: Uuid,
    connection: Box<dyn Connection>,
    services: GatewayServices,
    client: ClientContext,
    request: StatementRequest,
    cache: StatementCache,
    transaction: TransactionState,
    debug_mode: bool,
    log_targets: Vec<LogTarget>,
}

impl Gateway {
    /// Resolves connection settings, connects, and checks the client's
    /// reputation.
    ///
    /// `config.db` is the explicit layer; `session` supplies whatever it
    /// leaves unset. Connection failures are written in detail to the
    /// diagnostic log and reported as a generic [`GatewayError::Connection`].
    #[instrument(skip_all, fields(ip = %client.ip_address))]
    pub fn connect(
        config: &GatewayConfig,
        session: &DbConfigLayer,
        connector: &dyn Connector,
        services: GatewayServices,
        client: ClientContext,
    ) -> GatewayResult<Self> {
        let db = DbConfigLayer::resolve(&config.db, session)?;
        let dsn = build_dsn(db.driver, &db.host, &db.name, db.port);

        let target = ConnectTarget {
            dsn,
            driver: db.driver_name.clone(),
            host: db.host.clone(),
            port: db.port,
            database: db.name.clone(),
            user: db.user.clone(),
            password: db.pass.expose().clone(),
            options: ConnectOptions::default(),
        };
        debug!(?target, "Connecting");

        let connection = match connector.connect(&target) {
            Ok(connection) => connection,
            Err(e) => {
                warn!(error = %e, driver = %db.driver_name, "Connection failed");
                services.diagnostics.log_error(
                    &format!("Connection failed: {e}"),
                    &services.log_targets,
                    &client,
                )?;
                return Err(GatewayError::connection(e));
            }
        };

        Self::from_connection(connection, services, client)
    }

    /// Wraps an already open connection, then checks the client's reputation.
    pub fn from_connection(
        connection: Box<dyn Connection>,
        services: GatewayServices,
        mut client: ClientContext,
    ) -> GatewayResult<Self> {
        if client.host_name.is_none() {
            client.host_name = Some(services.resolver.resolve(&client.ip_address));
        }

        if services.ledger.is_blocked(&client.ip_address)? {
            warn!(ip = %client.ip_address, "Refusing blocked client");
            return Err(GatewayError::access_denied(&client.ip_address));
        }

        let gateway = Self {
            id: Uuid::new_v4(),
            log_targets: services.log_targets.clone(),
            connection,
            services,
            client,
            request: StatementRequest::default(),
            cache: StatementCache::new(),
            transaction: TransactionState::NotStarted,
            debug_mode: false,
        };
        info!(
            gateway = %gateway.id,
            ip = %gateway.client.ip_address,
            driver = gateway.connection.driver_id(),
            "Gateway ready"
        );
        Ok(gateway)
    }

    /// Replaces the statement text and drops the parameters bound so far.
    pub fn set_query(&mut self, sql: impl Into<String>) -> &mut Self {
        self.request.set_sql(sql);
        self
    }

    /// Adds a parameter, validating it first when `pattern` is given.
    ///
    /// A value that fails validation records an `INVALID_PARAMETER_VALUE`
    /// event against the client and leaves the bind set untouched.
    #[instrument(skip(self, value), fields(gateway = %self.id, ip = %self.client.ip_address))]
    pub fn add_param(
        &mut self,
        name: &str,
        value: impl Into<Value>,
        pattern: Option<&str>,
    ) -> GatewayResult<&mut Self> {
        let value = value.into();
        if let Some(pattern) = pattern {
            self.check_param(name, &value, pattern)?;
        }

        self.request.bind(name, value);
        self.request.set_validator(name, pattern);
        Ok(self)
    }

    /// Executes the statement built with `set_query` and `add_param`.
    pub fn execute(&mut self) -> GatewayResult<ExecutionResult> {
        let snapshot = self.request.clone();
        self.execute_request(&snapshot)
    }

    /// Executes `request`, answering from the cache when the same statement
    /// with the same parameters already ran on this gateway.
    ///
    /// Every parameter with a pattern in [`StatementRequest::validators`] is
    /// validated again before the cache or the connection is consulted.
    #[instrument(
        skip(self, request),
        fields(gateway = %self.id, ip = %self.client.ip_address, params = request.params().len())
    )]
    pub fn execute_request(&mut self, request: &StatementRequest) -> GatewayResult<ExecutionResult> {
        for (name, value, pattern) in request.patterned_params() {
            self.check_param(name, value, pattern)?;
        }

        let key = request.cache_key();
        if let Some(cached) = self.cache.get(&key) {
            debug!("Statement cache hit");
            return Ok(cached.clone());
        }

        match executor::run(self.connection.as_ref(), request, &mut self.transaction) {
            Ok(result) => {
                info!(
                    kind = ?result.kind,
                    elapsed = result.execution_time_seconds,
                    "Statement committed"
                );
                if self.debug_mode {
                    info!(sql = request.sql(), "Debug: statement executed");
                }
                self.cache.put(key, result.clone());
                Ok(result)
            }
            Err(e) => {
                tracing::error!(error = %e, "Statement execution failed");
                let message = format!("Execution failed: {e}; Query: {}", request.sql());
                self.services
                    .diagnostics
                    .log_error(&message, &self.log_targets, &self.client)?;
                Err(GatewayError::query_execution(e))
            }
        }
    }

    /// Records `INVALID_PARAMETER_VALUE` against the client when `value`
    /// does not match `pattern`.
    fn check_param(&self, name: &str, value: &Value, pattern: &str) -> GatewayResult<()> {
        if self.services.validator.validate(value, pattern) {
            return Ok(());
        }

        let code = EventCode::InvalidParameterValue;
        let message = parameter_event_message(&code, name, &value.render());
        self.services.ledger.record(
            code,
            self.client.user_label(),
            &self.client.ip_address,
            self.client.host_label(),
            &message,
        )?;
        warn!(parameter = name, "Parameter failed validation");
        Err(GatewayError::validation(name))
    }

    /// Turns on debug mode and replaces the diagnostic targets.
    pub fn enable_debug_mode(
        &mut self,
        targets: impl IntoIterator<Item = LogTarget>,
    ) -> &mut Self {
        self.debug_mode = true;
        self.log_targets = targets.into_iter().collect();
        info!(gateway = %self.id, targets = ?self.log_targets, "Debug mode enabled");
        self
    }

    /// Full content of the diagnostic log file
    pub fn get_logs(&self) -> GatewayResult<String> {
        Ok(self.services.diagnostics.get_logs()?)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn client(&self) -> &ClientContext {
        &self.client
    }

    pub fn request(&self) -> &StatementRequest {
        &self.request
    }

    pub fn transaction_state(&self) -> TransactionState {
        self.transaction
    }

    pub fn cached_results(&self) -> &StatementCache {
        &self.cache
    }

    pub fn is_debug_mode(&self) -> bool {
        self.debug_mode
    }

    pub fn log_targets(&self) -> &[LogTarget] {
        &self.log_targets
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("id", &self.id)
            .field("driver", &self.connection.driver_id())
            .field("client", &self.client)
            .field("transaction", &self.transaction)
            .field("cached", &self.cache.len())
            .finish_non_exhaustive()
    }
}
