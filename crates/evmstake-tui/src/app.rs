//! Application state and logic.

use crate::action::Action;
use crate::log_buffer::LogBuffer;
use crate::theme::{Palette, Theme};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use evmstake_chain::{
    ChainError, StakingCall, UnbondingQuery, UnbondingTracker, plan_delegate, plan_undelegate,
    plan_withdraw_commission,
};
use evmstake_core::{
    AmountForm, ConnectionStatus, FailureReason, FormKind, Project, StakingSnapshot, StatusBoard,
    StatusEffect, StatusKind, StatusMessage, TxEvent, TxLifecycle, Validator, WalletSession,
    reference_balance,
};
use ratatui::widgets::TableState;
use std::time::{Duration, Instant};

/// How often relative unbonding times are recomputed.
const CLOCK_INTERVAL: Duration = Duration::from_secs(60);

/// Slider step for PgUp/PgDn.
const PAGE_STEP: i16 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    /// Validators of the selected project.
    #[default]
    Validators,
    /// Staking modal for the opened validator.
    Staking,
}

/// Application state.
pub struct App {
    pub palette: Palette,
    pub project: Project,
    pub connection_status: ConnectionStatus,
    /// Account the staking view acts for.
    pub session: WalletSession,
    pub view: View,
    pub validators_table_state: TableState,
    /// Active tab of the staking modal.
    pub tab: FormKind,
    stake_form: AmountForm,
    undelegate_form: AmountForm,
    opened: Option<usize>,
    pub snapshot: StakingSnapshot,
    /// Whether `snapshot` belongs to the opened validator.
    pub snapshot_loaded: bool,
    pub tx: TxLifecycle,
    pub status: StatusBoard,
    /// Call waiting for approval at the signature prompt.
    pub confirm: Option<StakingCall>,
    pub unbonding: UnbondingTracker,
    refresh: u64,
    /// Wall clock in unix seconds, advanced every [`CLOCK_INTERVAL`].
    pub now_unix: i64,
    next_clock: Instant,
    pub log_buffer: LogBuffer,
    pub show_logs: bool,
    pub should_quit: bool,
    tick_count: u64,
}

impl App {
    pub fn new(project: Project, log_buffer: LogBuffer, theme: Theme) -> Self {
        let decimals = project.decimals;
        let mut validators_table_state = TableState::default();
        if !project.validators.is_empty() {
            validators_table_state.select(Some(0));
        }
        Self {
            palette: theme.palette(),
            project,
            connection_status: ConnectionStatus::Disconnected,
            session: WalletSession::disconnected(),
            view: View::default(),
            validators_table_state,
            tab: FormKind::Stake,
            stake_form: AmountForm::with_decimals(FormKind::Stake, decimals),
            undelegate_form: AmountForm::with_decimals(FormKind::Undelegate, decimals),
            opened: None,
            snapshot: StakingSnapshot::default(),
            snapshot_loaded: false,
            tx: TxLifecycle::new(),
            status: StatusBoard::new(),
            confirm: None,
            unbonding: UnbondingTracker::new(),
            refresh: 0,
            now_unix: chrono::Utc::now().timestamp(),
            next_clock: Instant::now() + CLOCK_INTERVAL,
            log_buffer,
            show_logs: true,
            should_quit: false,
            tick_count: 0,
        }
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn validators(&self) -> &[Validator] {
        &self.project.validators
    }

    /// Validator shown in the staking modal.
    pub fn current_validator(&self) -> Option<&Validator> {
        self.opened.and_then(|i| self.project.validators.get(i))
    }

    /// Form of the active tab.
    pub fn form(&self) -> &AmountForm {
        match self.tab {
            FormKind::Stake => &self.stake_form,
            FormKind::Undelegate => &self.undelegate_form,
        }
    }

    fn form_mut(&mut self) -> &mut AmountForm {
        match self.tab {
            FormKind::Stake => &mut self.stake_form,
            FormKind::Undelegate => &mut self.undelegate_form,
        }
    }

    /// A transaction is waiting on the signer or on the chain.
    pub fn in_flight(&self) -> bool {
        self.tx.is_active()
    }

    /// The session account operates the opened validator.
    pub fn is_owner(&self) -> bool {
        self.current_validator()
            .is_some_and(|v| self.session.is_owner_of(v))
    }

    /// Inputs of the unbonding watcher for the current state.
    pub fn unbonding_query(&self) -> UnbondingQuery {
        UnbondingQuery {
            address: self.session.address_hex(),
            api_url: self.project.api_url.clone(),
            refresh: self.refresh,
        }
    }

    /// Returns the query to hand to the watcher if it changed since last call.
    pub fn sync_unbonding(&mut self) -> Option<UnbondingQuery> {
        let query = self.unbonding_query();
        self.unbonding.begin(query.clone()).then_some(query)
    }

    /// Advance timers. May ask the main loop to refetch.
    pub fn tick(&mut self, now: Instant) -> Option<Action> {
        self.tick_count = self.tick_count.wrapping_add(1);

        if now >= self.next_clock {
            self.now_unix = chrono::Utc::now().timestamp();
            self.next_clock = now + CLOCK_INTERVAL;
        }

        let effect = self.status.tick(now)?;
        self.apply_effect(effect)
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Action> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Some(Action::Quit);
        }
        if self.confirm.is_some() {
            return self.handle_confirm_key(key);
        }
        match self.view {
            View::Validators => self.handle_list_key(key),
            View::Staking => self.handle_staking_key(key),
        }
    }

    fn handle_list_key(&mut self, key: KeyEvent) -> Option<Action> {
        match key.code {
            KeyCode::Char('q') => Some(Action::Quit),
            KeyCode::Up | KeyCode::Char('k') => {
                self.select_previous();
                None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.select_next();
                None
            }
            KeyCode::Enter => {
                let index = self.validators_table_state.selected()?;
                self.open_validator(index)
            }
            KeyCode::Char('r') => self.refresh(),
            KeyCode::Char('l') => {
                self.show_logs = !self.show_logs;
                None
            }
            _ => None,
        }
    }

    fn handle_staking_key(&mut self, key: KeyEvent) -> Option<Action> {
        let in_flight = self.in_flight();
        let controls = self.form().controls_enabled(in_flight);

        match key.code {
            KeyCode::Char('q') => return Some(Action::Quit),
            KeyCode::Esc => self.close_modal(),
            KeyCode::Tab | KeyCode::BackTab if !in_flight => {
                self.tab = match self.tab {
                    FormKind::Stake => FormKind::Undelegate,
                    FormKind::Undelegate => FormKind::Stake,
                };
            }
            KeyCode::Char(c) if (c.is_ascii_digit() || c == '.') && !in_flight => {
                self.form_mut().push_char(c);
            }
            KeyCode::Backspace if !in_flight => self.form_mut().pop_char(),
            KeyCode::Left if controls => self.form_mut().step_percentage(-1),
            KeyCode::Right if controls => self.form_mut().step_percentage(1),
            KeyCode::PageDown if controls => self.form_mut().step_percentage(-PAGE_STEP),
            KeyCode::PageUp if controls => self.form_mut().step_percentage(PAGE_STEP),
            KeyCode::Char('m') if controls => self.form_mut().set_max(),
            KeyCode::Enter => return self.submit(),
            KeyCode::Char('w') => return self.withdraw_commission(),
            KeyCode::Char('r') => return self.refresh(),
            KeyCode::Char('l') => self.show_logs = !self.show_logs,
            _ => {}
        }
        None
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) -> Option<Action> {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                let call = self.confirm.take()?;
                tracing::info!("Approved {}", call.action().label());
                Some(Action::Submit(call))
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.confirm = None;
                tracing::info!("Signature request rejected");
                self.apply_tx_event(TxEvent::Failed(FailureReason::UserRejected));
                None
            }
            _ => None,
        }
    }

    /// Open the staking modal on the Delegate tab with a clean status.
    pub fn open_validator(&mut self, index: usize) -> Option<Action> {
        if self.in_flight() {
            return None;
        }
        let validator = self.project.validators.get(index)?;
        tracing::info!("Opened validator {}", validator.display_name());

        self.opened = Some(index);
        self.view = View::Staking;
        self.tab = FormKind::Stake;
        self.status.reset();
        self.tx.reset();
        self.confirm = None;
        self.stake_form.clear();
        self.undelegate_form.clear();
        self.snapshot = StakingSnapshot::default();
        self.snapshot_loaded = false;
        self.stake_form.set_balance(Default::default());
        self.undelegate_form.set_balance(Default::default());
        Some(Action::Refresh)
    }

    /// Open the validator whose contract address matches `address`.
    pub fn open_by_address(&mut self, address: &str) -> Option<Action> {
        let index = self
            .project
            .validators
            .iter()
            .position(|v| v.address.eq_ignore_ascii_case(address))?;
        self.validators_table_state.select(Some(index));
        self.open_validator(index)
    }

    /// Close the modal unless a transaction is pending.
    pub fn close_modal(&mut self) {
        if self.in_flight() {
            return;
        }
        self.view = View::Validators;
        self.opened = None;
    }

    fn refresh(&mut self) -> Option<Action> {
        self.refresh = self.refresh.wrapping_add(1);
        Some(Action::Refresh)
    }

    fn submit(&mut self) -> Option<Action> {
        let contract = self.current_validator()?.contract_address();
        let amount = match self.form().validate(self.in_flight()) {
            Ok(amount) => amount,
            Err(e) => {
                tracing::debug!("Submit ignored: {}", e);
                return None;
            }
        };
        let Some(contract) = contract else {
            self.show_error("Invalid validator address");
            return None;
        };
        let planned = match self.tab {
            FormKind::Stake => plan_delegate(&self.session, contract, amount),
            FormKind::Undelegate => plan_undelegate(&self.session, contract, &self.snapshot, amount),
        };
        self.request_signature(planned)
    }

    fn withdraw_commission(&mut self) -> Option<Action> {
        if self.in_flight() || !self.is_owner() {
            return None;
        }
        let planned = plan_withdraw_commission(&self.session, self.current_validator()?);
        self.request_signature(planned)
    }

    /// Enter the signature phase and show the confirmation prompt.
    fn request_signature(&mut self, planned: Result<StakingCall, ChainError>) -> Option<Action> {
        let call = match planned {
            Ok(call) => call,
            Err(e) => {
                tracing::warn!("Cannot submit: {}", e);
                self.show_error(&e.to_string());
                return None;
            }
        };
        let phase = match self.tx.begin(call.action()) {
            Ok(phase) => phase.clone(),
            Err(e) => {
                tracing::warn!("{}", e);
                return None;
            }
        };
        self.status.observe(&phase, Instant::now());
        self.confirm = Some(call);
        None
    }

    fn show_error(&mut self, message: &str) {
        self.status
            .set(StatusMessage::new(message, StatusKind::Error));
    }

    fn apply_tx_event(&mut self, event: TxEvent) {
        let phase = match self.tx.apply(event) {
            Ok(phase) => phase.clone(),
            Err(e) => {
                tracing::warn!("Ignoring transaction event: {}", e);
                return;
            }
        };
        tracing::debug!("Transaction phase: {}", phase.name());
        if let Some(effect) = self.status.observe(&phase, Instant::now()) {
            self.apply_effect(effect);
        }
    }

    fn apply_effect(&mut self, effect: StatusEffect) -> Option<Action> {
        match effect {
            StatusEffect::ClearInputs => {
                self.stake_form.clear();
                self.undelegate_form.clear();
                None
            }
            StatusEffect::Refetch => self.refresh(),
        }
    }

    pub fn handle_action(&mut self, action: Action) {
        match action {
            Action::UpdateConnectionStatus(status) => self.connection_status = status,
            Action::SetSession(session) => {
                if let Some(address) = session.address_hex() {
                    tracing::info!("Acting for {}", address);
                }
                self.session = session;
            }
            Action::SetSnapshot {
                validator,
                snapshot,
            } => {
                let current = self.current_validator().and_then(|v| v.contract_address());
                if current != Some(validator) {
                    tracing::debug!("Dropping snapshot for {}", validator);
                    return;
                }
                self.snapshot = *snapshot;
                self.snapshot_loaded = true;
                self.stake_form
                    .set_balance(reference_balance(&self.snapshot, FormKind::Stake));
                self.undelegate_form
                    .set_balance(reference_balance(&self.snapshot, FormKind::Undelegate));
            }
            Action::Tx(event) => self.apply_tx_event(event),
            Action::Unbonding(update) => {
                self.unbonding.apply(update);
            }
            Action::Quit => self.should_quit = true,
            Action::Refresh | Action::Submit(_) => {}
        }
    }

    pub fn select_previous(&mut self) {
        let len = self.project.validators.len();
        if len == 0 {
            return;
        }
        let i = match self.validators_table_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.validators_table_state.select(Some(i));
    }

    pub fn select_next(&mut self) {
        let len = self.project.validators.len();
        if len == 0 {
            return;
        }
        let i = match self.validators_table_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.validators_table_state.select(Some(i));
    }
}
