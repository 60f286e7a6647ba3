//! Bidirectional conversion engine
//!
//! A single task owns the [`ConversionState`] and applies every change to it:
//! user commands from [`EngineHandle`], quote completions, debounce timers and
//! connectivity updates all arrive as messages, so no locking is needed.
//! Each change replaces the snapshot and publishes it on a watch channel.

use crate::core::amount::{format_amount, parse_amount, sanitize_amount};
use crate::core::connectivity::{ConnectivityMonitor, NetworkStatus, StatusStream};
use crate::core::currency::{CurrencyCode, CurrencyRegistry};
use crate::core::quote::{Quote, QuoteError, QuoteGateway};
use crate::core::state::{ConversionState, rate_text};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

pub const VALIDATION_REJECTED_MESSAGE: &str =
    "We couldn't process this amount for the selected currencies.";
pub const SERVER_FAULT_MESSAGE: &str = "Service is temporarily unavailable. Please try again later.";
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please try again.";

#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub from: CurrencyCode,
    pub to: CurrencyCode,
    /// Source amount converted right after the engine starts.
    pub amount_from: String,
    /// Quiet period after an amount edit before a quote is requested.
    /// `None` leaves conversions entirely to explicit calls.
    pub debounce: Option<Duration>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        let (from, to) = CurrencyRegistry::builtin().default_pair();
        EngineOptions {
            from,
            to,
            amount_from: "300.00".to_string(),
            debounce: Some(Duration::from_millis(400)),
        }
    }
}

/// Which amount field drives a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// From the sending amount to the receiving amount.
    Forward,
    /// From the receiving amount back to the sending amount.
    Reverse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Ticket {
    direction: Direction,
    seq: u64,
}

#[derive(Debug)]
enum Command {
    SetAmountFrom(String),
    SetAmountTo(String),
    SetCurrencyPair(CurrencyCode, CurrencyCode),
    Reverse,
    Convert(Direction),
    NetworkStatusChanged(NetworkStatus),
    DismissNoNetworkBanner,
    Sync(oneshot::Sender<()>),
    Shutdown,
}

#[derive(Debug)]
enum Event {
    QuoteResolved {
        ticket: Ticket,
        result: Result<Quote, QuoteError>,
    },
    DebounceElapsed {
        direction: Direction,
        generation: u64,
    },
}

/// Cloneable front door to a running engine.
///
/// Every operation only enqueues a command; failures never surface here and
/// show up in the published state instead.
#[derive(Clone)]
pub struct EngineHandle {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<ConversionState>,
}

impl EngineHandle {
    pub fn set_amount_from(&self, text: &str) {
        self.send(Command::SetAmountFrom(text.to_string()));
    }

    pub fn set_amount_to(&self, text: &str) {
        self.send(Command::SetAmountTo(text.to_string()));
    }

    pub fn set_currency_pair(&self, from: CurrencyCode, to: CurrencyCode) {
        self.send(Command::SetCurrencyPair(from, to));
    }

    pub fn reverse(&self) {
        self.send(Command::Reverse);
    }

    pub fn convert_forward(&self) {
        self.send(Command::Convert(Direction::Forward));
    }

    pub fn convert_reverse(&self) {
        self.send(Command::Convert(Direction::Reverse));
    }

    pub fn on_network_status_changed(&self, status: NetworkStatus) {
        self.send(Command::NetworkStatusChanged(status));
    }

    pub fn dismiss_no_network_banner(&self) {
        self.send(Command::DismissNoNetworkBanner);
    }

    /// Stops the engine and releases its connectivity subscription.
    pub fn shutdown(&self) {
        self.send(Command::Shutdown);
    }

    /// Latest published snapshot.
    pub fn state(&self) -> ConversionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConversionState> {
        self.state.clone()
    }

    /// Waits until every command sent so far has been applied and no quote
    /// is in flight. Edits still waiting on their debounce timer are not
    /// awaited.
    pub async fn settled(&self) -> ConversionState {
        let (ack, applied) = oneshot::channel();
        if self.commands.send(Command::Sync(ack)).is_ok() {
            let _ = applied.await;
        }
        let mut receiver = self.state.clone();
        let settled = receiver
            .wait_for(|state| !state.loading)
            .await
            .map(|state| state.clone());
        settled.unwrap_or_else(|_| receiver.borrow().clone())
    }

    fn send(&self, command: Command) {
        if let Err(e) = self.commands.send(command) {
            warn!(command = ?e.0, "Conversion engine is not running");
        }
    }
}

pub struct ConversionEngine {
    state: ConversionState,
    publisher: watch::Sender<ConversionState>,
    gateway: Arc<dyn QuoteGateway>,
    events: mpsc::UnboundedSender<Event>,
    debounce: Option<Duration>,
    forward_seq: u64,
    reverse_seq: u64,
    /// Newest issued request; completions for any other ticket are dropped.
    latest: Option<Ticket>,
    debounce_generation: u64,
    pending_debounce: Option<u64>,
}

impl ConversionEngine {
    /// Starts the engine on the current tokio runtime.
    ///
    /// Subscribes to `monitor` once and issues the initial forward conversion
    /// for `options.amount_from`.
    pub fn spawn(
        gateway: Arc<dyn QuoteGateway>,
        monitor: &dyn ConnectivityMonitor,
        options: EngineOptions,
    ) -> EngineHandle {
        let initial = ConversionState::new(
            options.from,
            options.to,
            sanitize_amount(&options.amount_from),
        );
        let (publisher, state) = watch::channel(initial.clone());
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let statuses = monitor.observe();

        let mut engine = ConversionEngine {
            state: initial,
            publisher,
            gateway,
            events: events_tx,
            debounce: options.debounce,
            forward_seq: 0,
            reverse_seq: 0,
            latest: None,
            debounce_generation: 0,
            pending_debounce: None,
        };
        info!(
            from = %options.from,
            to = %options.to,
            "Starting conversion engine"
        );
        engine.convert(Direction::Forward);
        tokio::spawn(engine.run(commands_rx, events_rx, statuses));

        EngineHandle {
            commands: commands_tx,
            state,
        }
    }

    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut events: mpsc::UnboundedReceiver<Event>,
        mut statuses: StatusStream,
    ) {
        let mut statuses_open = true;
        loop {
            tokio::select! {
                biased;

                status = statuses.next(), if statuses_open => match status {
                    Some(status) => self.on_network_status_changed(status),
                    None => {
                        debug!("Connectivity stream ended");
                        statuses_open = false;
                    }
                },
                command = commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
                Some(event) = events.recv() => self.handle_event(event),
            }
        }
        info!("Conversion engine stopped");
    }

    fn handle_command(&mut self, command: Command) {
        debug!(?command, "Applying command");
        match command {
            Command::SetAmountFrom(text) => self.set_amount(Direction::Forward, &text),
            Command::SetAmountTo(text) => self.set_amount(Direction::Reverse, &text),
            Command::SetCurrencyPair(from, to) => {
                self.latest = None;
                self.apply(|s| ConversionState {
                    from_currency: from,
                    to_currency: to,
                    loading: false,
                    ..s.clone()
                });
            }
            Command::Reverse => {
                self.pending_debounce = None;
                self.latest = None;
                self.apply(|s| ConversionState {
                    loading: false,
                    ..s.reversed()
                });
                self.convert(Direction::Forward);
            }
            Command::Convert(direction) => self.convert(direction),
            Command::NetworkStatusChanged(status) => self.on_network_status_changed(status),
            Command::DismissNoNetworkBanner => self.apply(|s| ConversionState {
                show_no_network_banner: false,
                ..s.clone()
            }),
            Command::Sync(ack) => {
                let _ = ack.send(());
            }
            Command::Shutdown => {}
        }
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::QuoteResolved { ticket, result } => self.on_quote_resolved(ticket, result),
            Event::DebounceElapsed {
                direction,
                generation,
            } => {
                if self.pending_debounce == Some(generation) {
                    self.convert(direction);
                }
            }
        }
    }

    /// The single place where the snapshot is replaced and published.
    fn apply(&mut self, update: impl FnOnce(&ConversionState) -> ConversionState) {
        let next = update(&self.state);
        if next != self.state {
            self.state = next.clone();
            self.publisher.send_replace(next);
        }
    }

    /// Edited text is newer than any outstanding quote, which gets dropped.
    fn set_amount(&mut self, direction: Direction, text: &str) {
        let cleaned = sanitize_amount(text);
        self.latest = None;
        self.apply(|s| match direction {
            Direction::Forward => ConversionState {
                amount_from: cleaned,
                error: None,
                loading: false,
                ..s.clone()
            },
            Direction::Reverse => ConversionState {
                amount_to: cleaned,
                error: None,
                loading: false,
                ..s.clone()
            },
        });
        self.schedule_debounce(direction);
    }

    fn schedule_debounce(&mut self, direction: Direction) {
        let Some(delay) = self.debounce else {
            return;
        };
        self.debounce_generation += 1;
        let generation = self.debounce_generation;
        self.pending_debounce = Some(generation);

        let events = self.events.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(Event::DebounceElapsed {
                direction,
                generation,
            });
        });
    }

    fn convert(&mut self, direction: Direction) {
        self.pending_debounce = None;

        // The reverse direction sends the receiving amount in the swapped pair.
        let (text, from, to) = match direction {
            Direction::Forward => (
                &self.state.amount_from,
                self.state.from_currency,
                self.state.to_currency,
            ),
            Direction::Reverse => (
                &self.state.amount_to,
                self.state.to_currency,
                self.state.from_currency,
            ),
        };
        let Some(amount) = parse_amount(text) else {
            debug!(?direction, text = %text, "Ignoring unparsable amount");
            return;
        };

        if let Err(limit) = from.check_send_limit(amount) {
            debug!(%limit, requested = amount, "Amount above sending limit");
            self.latest = None;
            let message = limit.to_string();
            self.apply(|s| ConversionState {
                loading: false,
                error: Some(message),
                ..s.clone()
            });
            return;
        }

        let ticket = self.issue_ticket(direction);
        self.apply(|s| ConversionState {
            loading: true,
            error: None,
            ..s.clone()
        });

        debug!(?ticket, %from, %to, amount, "Requesting quote");
        let gateway = Arc::clone(&self.gateway);
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = gateway.get_quote(from, to, amount).await;
            let _ = events.send(Event::QuoteResolved { ticket, result });
        });
    }

    fn issue_ticket(&mut self, direction: Direction) -> Ticket {
        let seq = match direction {
            Direction::Forward => {
                self.forward_seq += 1;
                self.forward_seq
            }
            Direction::Reverse => {
                self.reverse_seq += 1;
                self.reverse_seq
            }
        };
        let ticket = Ticket { direction, seq };
        self.latest = Some(ticket);
        ticket
    }

    fn on_quote_resolved(&mut self, ticket: Ticket, result: Result<Quote, QuoteError>) {
        if self.latest != Some(ticket) {
            debug!(?ticket, latest = ?self.latest, "Discarding stale quote");
            return;
        }
        self.latest = None;

        match result {
            Ok(quote) => {
                debug!(?quote, "Quote received");
                self.apply(|s| apply_quote(s, ticket.direction, &quote));
            }
            Err(e) => {
                warn!(error = %e, "Quote request failed");
                self.apply(|s| apply_failure(s, &e));
            }
        }
    }

    fn on_network_status_changed(&mut self, status: NetworkStatus) {
        debug!(%status, "Network status changed");
        self.apply(|s| apply_network_status(s, status));
    }
}

/// Writes a quote into the fields its direction drives.
fn apply_quote(state: &ConversionState, direction: Direction, quote: &Quote) -> ConversionState {
    let (amount_from, amount_to) = match direction {
        Direction::Forward => (quote.amount_from, quote.amount_to),
        Direction::Reverse => (quote.amount_to, quote.amount_from),
    };
    ConversionState {
        amount_from: format_amount(amount_from),
        amount_to: format_amount(amount_to),
        rate_text: rate_text(quote.from_currency, quote.to_currency, quote.rate),
        loading: false,
        ..state.clone()
    }
}

/// Inline message for a failed quote; `None` when the banner reports it.
fn failure_message(error: &QuoteError) -> Option<&'static str> {
    match error {
        QuoteError::NetworkUnreachable(_) => None,
        QuoteError::ServerValidationRejected { .. } => Some(VALIDATION_REJECTED_MESSAGE),
        QuoteError::ServerFault { .. } => Some(SERVER_FAULT_MESSAGE),
        QuoteError::Generic(_) => Some(GENERIC_FAILURE_MESSAGE),
    }
}

fn apply_failure(state: &ConversionState, error: &QuoteError) -> ConversionState {
    match failure_message(error) {
        Some(message) => ConversionState {
            loading: false,
            error: Some(message.to_string()),
            ..state.clone()
        },
        None => ConversionState {
            loading: false,
            error: None,
            network_available: false,
            show_no_network_banner: true,
            ..state.clone()
        },
    }
}

fn apply_network_status(state: &ConversionState, status: NetworkStatus) -> ConversionState {
    match status {
        NetworkStatus::Available => ConversionState {
            network_available: true,
            show_no_network_banner: false,
            ..state.clone()
        },
        NetworkStatus::Unavailable | NetworkStatus::Lost => ConversionState {
            network_available: false,
            show_no_network_banner: true,
            ..state.clone()
        },
        NetworkStatus::Losing => state.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use futures::channel::mpsc::{UnboundedReceiver, UnboundedSender, unbounded};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    enum Reply {
        Quote {
            delay: Duration,
            rate: f64,
            amount_from: Option<f64>,
            amount_to: Option<f64>,
        },
        Fail(QuoteError),
    }

    fn quote(rate: f64, amount_from: f64, amount_to: f64) -> Reply {
        Reply::Quote {
            delay: Duration::ZERO,
            rate,
            amount_from: Some(amount_from),
            amount_to: Some(amount_to),
        }
    }

    #[derive(Default)]
    struct ScriptedGateway {
        calls: Mutex<Vec<(String, String, f64)>>,
        replies: Mutex<VecDeque<Reply>>,
    }

    impl ScriptedGateway {
        fn push(&self, reply: Reply) {
            self.replies.lock().unwrap().push_back(reply);
        }

        fn calls(&self) -> Vec<(String, String, f64)> {
            self.calls.lock().unwrap().clone()
        }

        fn clear_calls(&self) {
            self.calls.lock().unwrap().clear();
        }
    }

    #[async_trait]
    impl QuoteGateway for ScriptedGateway {
        async fn get_quote(
            &self,
            from: CurrencyCode,
            to: CurrencyCode,
            amount: f64,
        ) -> Result<Quote, QuoteError> {
            self.calls
                .lock()
                .unwrap()
                .push((from.to_string(), to.to_string(), amount));
            let reply = self.replies.lock().unwrap().pop_front();
            match reply {
                None => Quote::from_rate(from, to, amount, 7.23, None, None),
                Some(Reply::Quote {
                    delay,
                    rate,
                    amount_from,
                    amount_to,
                }) => {
                    tokio::time::sleep(delay).await;
                    Quote::from_rate(from, to, amount, rate, amount_from, amount_to)
                }
                Some(Reply::Fail(e)) => Err(e),
            }
        }
    }

    struct FakeMonitor {
        receiver: Mutex<Option<UnboundedReceiver<NetworkStatus>>>,
    }

    impl ConnectivityMonitor for FakeMonitor {
        fn observe(&self) -> StatusStream {
            match self.receiver.lock().unwrap().take() {
                Some(receiver) => receiver.boxed(),
                None => futures::stream::pending().boxed(),
            }
        }
    }

    fn fake_monitor() -> (FakeMonitor, UnboundedSender<NetworkStatus>) {
        let (sender, receiver) = unbounded();
        sender.unbounded_send(NetworkStatus::Available).unwrap();
        let monitor = FakeMonitor {
            receiver: Mutex::new(Some(receiver)),
        };
        (monitor, sender)
    }

    fn options(amount_from: &str) -> EngineOptions {
        EngineOptions {
            amount_from: amount_from.to_string(),
            debounce: None,
            ..EngineOptions::default()
        }
    }

    fn start(
        gateway: &Arc<ScriptedGateway>,
        options: EngineOptions,
    ) -> (EngineHandle, UnboundedSender<NetworkStatus>) {
        let (monitor, statuses) = fake_monitor();
        let handle = ConversionEngine::spawn(
            Arc::clone(gateway) as Arc<dyn QuoteGateway>,
            &monitor,
            options,
        );
        (handle, statuses)
    }

    async fn wait_until(
        handle: &EngineHandle,
        condition: impl FnMut(&ConversionState) -> bool,
    ) -> ConversionState {
        let mut receiver = handle.subscribe();
        let state = tokio::time::timeout(Duration::from_secs(5), receiver.wait_for(condition))
            .await
            .expect("timed out waiting for state")
            .expect("engine stopped")
            .clone();
        state
    }

    #[tokio::test]
    async fn test_initial_forward_conversion() {
        let gateway = Arc::new(ScriptedGateway::default());
        let (engine, _statuses) = start(&gateway, options("300.00"));

        let state = engine.settled().await;
        assert_eq!(state.from_currency.as_str(), "PLN");
        assert_eq!(state.to_currency.as_str(), "UAH");
        assert_eq!(state.amount_from, "300.00");
        assert_eq!(state.amount_to, "2169.00");
        assert_eq!(state.rate_text, "1 PLN = 7.23 UAH");
        assert!(!state.loading);
        assert!(state.error.is_none());
        assert_eq!(gateway.calls(), vec![("PLN".into(), "UAH".into(), 300.0)]);
    }

    #[tokio::test]
    async fn test_convert_forward_updates_state() {
        let gateway = Arc::new(ScriptedGateway::default());
        let (engine, _statuses) = start(&gateway, options("300.00"));
        engine.settled().await;
        gateway.clear_calls();

        gateway.push(quote(7.23, 300.0, 2169.0));
        engine.set_amount_from("300");
        engine.convert_forward();

        let state = engine.settled().await;
        assert_eq!(state.amount_from, "300.00");
        assert_eq!(state.amount_to, "2169.00");
        assert_eq!(state.rate_text, "1 PLN = 7.23 UAH");
        assert!(!state.loading);
        assert!(state.error.is_none());
        assert_eq!(gateway.calls(), vec![("PLN".into(), "UAH".into(), 300.0)]);
    }

    #[tokio::test]
    async fn test_amount_above_limit_skips_gateway() {
        let gateway = Arc::new(ScriptedGateway::default());
        let (engine, _statuses) = start(&gateway, options("300.00"));
        engine.settled().await;
        gateway.clear_calls();

        engine.set_amount_from("21000");
        engine.convert_forward();

        let state = engine.settled().await;
        assert!(gateway.calls().is_empty());
        assert_eq!(
            state.error.as_deref(),
            Some("Maximum sending amount: 20000 PLN")
        );
        assert_eq!(state.amount_from, "21000");
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn test_network_failure_shows_banner_instead_of_error() {
        let gateway = Arc::new(ScriptedGateway::default());
        gateway.push(Reply::Fail(QuoteError::NetworkUnreachable(
            "dns error".into(),
        )));
        let (engine, _statuses) = start(&gateway, options("300.00"));

        let state = engine.settled().await;
        assert!(!state.loading);
        assert!(state.error.is_none());
        assert!(!state.network_available);
        assert!(state.show_no_network_banner);
    }

    #[tokio::test]
    async fn test_server_failures_set_inline_errors() {
        let cases = [
            (
                QuoteError::ServerValidationRejected { status: 422 },
                VALIDATION_REJECTED_MESSAGE,
            ),
            (QuoteError::ServerFault { status: 503 }, SERVER_FAULT_MESSAGE),
            (
                QuoteError::Generic("bad json".into()),
                GENERIC_FAILURE_MESSAGE,
            ),
        ];
        for (error, message) in cases {
            let gateway = Arc::new(ScriptedGateway::default());
            gateway.push(Reply::Fail(error));
            let (engine, _statuses) = start(&gateway, options("300.00"));

            let state = engine.settled().await;
            assert_eq!(state.error.as_deref(), Some(message));
            assert!(state.network_available);
            assert!(!state.show_no_network_banner);
            assert!(!state.loading);
            // Inputs stay untouched on failure
            assert_eq!(state.amount_from, "300.00");
            assert_eq!(state.amount_to, "0.00");
        }
    }

    #[tokio::test]
    async fn test_negative_quote_amounts_are_a_generic_failure() {
        let gateway = Arc::new(ScriptedGateway::default());
        gateway.push(quote(7.23, -300.0, -5.0));
        let (engine, _statuses) = start(&gateway, options("300.00"));

        let state = engine.settled().await;
        assert_eq!(state.error.as_deref(), Some(GENERIC_FAILURE_MESSAGE));
        assert_eq!(state.amount_from, "300.00");
        assert_eq!(state.amount_to, "0.00");
        assert_eq!(sanitize_amount(&state.amount_from), state.amount_from);
    }

    #[tokio::test]
    async fn test_editing_amount_sanitizes_and_clears_error() {
        let gateway = Arc::new(ScriptedGateway::default());
        let (engine, _statuses) = start(&gateway, options("300.00"));
        engine.set_amount_from("21000");
        engine.convert_forward();
        assert!(engine.settled().await.error.is_some());

        engine.set_amount_from("1 000,5.0 zł");
        let state = engine.settled().await;
        assert_eq!(state.amount_from, "1000,50");
        assert!(state.error.is_none());

        engine.set_amount_to("-12");
        engine.convert_reverse();
        engine.set_amount_to("7");
        let state = engine.settled().await;
        assert_eq!(state.amount_to, "7");
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn test_unparsable_amount_is_ignored() {
        let gateway = Arc::new(ScriptedGateway::default());
        let (engine, _statuses) = start(&gateway, options(""));
        engine.set_amount_from("abc");
        let before = engine.settled().await;
        gateway.clear_calls();

        engine.convert_forward();
        let after = engine.settled().await;
        assert_eq!(before, after);
        assert_eq!(after.amount_from, "");
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_convert_reverse_keeps_labels() {
        let gateway = Arc::new(ScriptedGateway::default());
        let (engine, _statuses) = start(&gateway, options(""));
        engine.set_amount_from("100,00");
        engine.set_amount_to("723,00");

        gateway.push(quote(0.1383, 723.0, 100.0));
        engine.convert_reverse();

        let state = engine.settled().await;
        assert_eq!(state.from_currency.as_str(), "PLN");
        assert_eq!(state.to_currency.as_str(), "UAH");
        assert_eq!(state.amount_from, "100.00");
        assert_eq!(state.amount_to, "723.00");
        assert_eq!(state.rate_text, "1 UAH = 0.1383 PLN");
        assert!(!state.loading);
        assert!(state.error.is_none());
        assert_eq!(gateway.calls(), vec![("UAH".into(), "PLN".into(), 723.0)]);
    }

    #[tokio::test]
    async fn test_convert_reverse_checks_receiving_currency_limit() {
        let gateway = Arc::new(ScriptedGateway::default());
        let (engine, _statuses) = start(&gateway, options(""));
        engine.set_amount_to("60000");
        engine.convert_reverse();

        let state = engine.settled().await;
        assert_eq!(
            state.error.as_deref(),
            Some("Maximum sending amount: 50000 UAH")
        );
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_reverse_swaps_and_converts_forward() {
        let gateway = Arc::new(ScriptedGateway::default());
        gateway.push(quote(7.23, 300.0, 2169.0));
        let (engine, _statuses) = start(&gateway, options("300"));
        let initial = engine.settled().await;
        gateway.clear_calls();

        gateway.push(quote(0.1383, 2169.0, 300.0));
        engine.reverse();
        let reversed = engine.settled().await;
        assert_eq!(reversed.from_currency.as_str(), "UAH");
        assert_eq!(reversed.to_currency.as_str(), "PLN");
        assert_eq!(reversed.amount_from, "2169.00");
        assert_eq!(reversed.amount_to, "300.00");
        assert_eq!(reversed.rate_text, "1 UAH = 0.1383 PLN");
        assert_eq!(gateway.calls(), vec![("UAH".into(), "PLN".into(), 2169.0)]);

        gateway.push(quote(7.23, 300.0, 2169.0));
        engine.reverse();
        assert_eq!(engine.settled().await, initial);
    }

    #[tokio::test]
    async fn test_set_currency_pair() {
        let gateway = Arc::new(ScriptedGateway::default());
        let (engine, _statuses) = start(&gateway, options("100"));
        engine.settled().await;

        engine.set_currency_pair("EUR".parse().unwrap(), "GBP".parse().unwrap());
        let state = engine.settled().await;
        assert_eq!(state.from_currency.as_str(), "EUR");
        assert_eq!(state.to_currency.as_str(), "GBP");

        engine.set_amount_from("6000");
        engine.convert_forward();
        assert_eq!(
            engine.settled().await.error.as_deref(),
            Some("Maximum sending amount: 5000 EUR")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_quote_is_discarded() {
        let gateway = Arc::new(ScriptedGateway::default());
        let (engine, _statuses) = start(&gateway, options("100"));
        engine.settled().await;

        gateway.push(Reply::Quote {
            delay: Duration::from_millis(500),
            rate: 1.0,
            amount_from: None,
            amount_to: None,
        });
        gateway.push(Reply::Quote {
            delay: Duration::from_millis(10),
            rate: 2.0,
            amount_from: None,
            amount_to: None,
        });

        engine.convert_forward();
        engine.convert_forward();
        let state = engine.settled().await;
        assert_eq!(state.amount_to, "200.00");
        assert_eq!(state.rate_text, "1 PLN = 2 UAH");

        tokio::time::sleep(Duration::from_secs(1)).await;
        let state = engine.settled().await;
        assert_eq!(state.amount_to, "200.00");
        assert_eq!(state.rate_text, "1 PLN = 2 UAH");
        assert_eq!(gateway.calls().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_edit_supersedes_outstanding_quote() {
        let gateway = Arc::new(ScriptedGateway::default());
        gateway.push(Reply::Quote {
            delay: Duration::from_millis(500),
            rate: 7.23,
            amount_from: None,
            amount_to: None,
        });
        let (engine, _statuses) = start(&gateway, options("300"));
        assert!(engine.state().loading);

        engine.set_amount_from("12");
        let state = engine.settled().await;
        assert!(!state.loading);

        tokio::time::sleep(Duration::from_secs(1)).await;
        let state = engine.settled().await;
        assert_eq!(state.amount_from, "12");
        assert_eq!(state.amount_to, "0.00");
        assert_eq!(state.rate_text, "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_edits_are_debounced() {
        let gateway = Arc::new(ScriptedGateway::default());
        let (engine, _statuses) = start(
            &gateway,
            EngineOptions {
                amount_from: String::new(),
                debounce: Some(Duration::from_millis(300)),
                ..EngineOptions::default()
            },
        );

        for text in ["1", "12", "120"] {
            engine.set_amount_from(text);
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        // Field text is reflected right away
        let state = engine.settled().await;
        assert_eq!(state.amount_from, "120");
        assert!(gateway.calls().is_empty());

        tokio::time::sleep(Duration::from_millis(400)).await;
        let state = engine.settled().await;
        assert_eq!(gateway.calls(), vec![("PLN".into(), "UAH".into(), 120.0)]);
        assert_eq!(state.amount_from, "120.00");
        assert_eq!(state.amount_to, format_amount(120.0 * 7.23));

        gateway.clear_calls();
        engine.set_amount_to("723");
        tokio::time::sleep(Duration::from_millis(400)).await;
        engine.settled().await;
        assert_eq!(gateway.calls(), vec![("UAH".into(), "PLN".into(), 723.0)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_explicit_convert_cancels_pending_debounce() {
        let gateway = Arc::new(ScriptedGateway::default());
        let (engine, _statuses) = start(
            &gateway,
            EngineOptions {
                amount_from: String::new(),
                debounce: Some(Duration::from_millis(300)),
                ..EngineOptions::default()
            },
        );

        engine.set_amount_from("50");
        engine.convert_forward();
        engine.settled().await;
        tokio::time::sleep(Duration::from_secs(1)).await;
        engine.settled().await;

        assert_eq!(gateway.calls(), vec![("PLN".into(), "UAH".into(), 50.0)]);
    }

    #[tokio::test]
    async fn test_network_status_updates_and_banner_dismissal() {
        let gateway = Arc::new(ScriptedGateway::default());
        let (engine, statuses) = start(&gateway, options("300"));
        engine.settled().await;

        statuses.unbounded_send(NetworkStatus::Lost).unwrap();
        let state = wait_until(&engine, |s| s.show_no_network_banner).await;
        assert!(!state.network_available);

        engine.dismiss_no_network_banner();
        let state = engine.settled().await;
        assert!(!state.show_no_network_banner);
        assert!(!state.network_available);

        statuses.unbounded_send(NetworkStatus::Available).unwrap();
        let state = wait_until(&engine, |s| s.network_available).await;
        assert!(!state.show_no_network_banner);

        engine.on_network_status_changed(NetworkStatus::Unavailable);
        let state = engine.settled().await;
        assert!(!state.network_available);
        assert!(state.show_no_network_banner);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connectivity_loss_while_quote_in_flight() {
        let gateway = Arc::new(ScriptedGateway::default());
        gateway.push(Reply::Quote {
            delay: Duration::from_millis(200),
            rate: 7.23,
            amount_from: Some(300.0),
            amount_to: Some(2169.0),
        });
        let (engine, statuses) = start(&gateway, options("300"));
        assert!(engine.state().loading);

        statuses.unbounded_send(NetworkStatus::Lost).unwrap();
        let state = wait_until(&engine, |s| s.show_no_network_banner).await;
        assert!(state.loading);

        let state = engine.settled().await;
        assert_eq!(state.amount_to, "2169.00");
        assert!(!state.network_available);
        assert!(state.show_no_network_banner);
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn test_shutdown_releases_connectivity_subscription() {
        let gateway = Arc::new(ScriptedGateway::default());
        let (engine, statuses) = start(&gateway, options("300"));
        engine.settled().await;
        assert!(!statuses.is_closed());

        engine.shutdown();
        for _ in 0..100 {
            if statuses.is_closed() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(statuses.is_closed());

        // Operations on a stopped engine are ignored
        engine.set_amount_from("5");
        assert_eq!(engine.settled().await.amount_from, "300.00");
    }

    #[test]
    fn test_losing_leaves_network_flags_unchanged() {
        let (from, to) = CurrencyRegistry::builtin().default_pair();
        let online = ConversionState::new(from, to, "1".into());
        assert_eq!(apply_network_status(&online, NetworkStatus::Losing), online);

        let offline = apply_network_status(&online, NetworkStatus::Lost);
        assert_eq!(apply_network_status(&offline, NetworkStatus::Losing), offline);
    }

    #[test]
    fn test_validation_failure_keeps_network_flags() {
        let (from, to) = CurrencyRegistry::builtin().default_pair();
        let online = ConversionState::new(from, to, "1".into());
        let offline = apply_network_status(&online, NetworkStatus::Lost);
        let state = apply_failure(
            &offline,
            &QuoteError::ServerValidationRejected { status: 422 },
        );
        assert_eq!(state.error.as_deref(), Some(VALIDATION_REJECTED_MESSAGE));
        assert!(!state.network_available);
        assert!(state.show_no_network_banner);
    }
}
