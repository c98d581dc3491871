// =============================================================================
// Engine: refresh cycles for the three app variants
// =============================================================================
//
// One cycle per tick of the scheduler:
//
//   advisor / day trading
//     fetch ticker -> ingest -> evaluate -> notify on buy/sell transition
//     (day trading also: check price alerts, refresh the order book)
//
//   overview
//     batched fetch of every tracked pair -> append to history -> rank
//
// A cycle never propagates errors. Failures set the status to Disconnected,
// land in the error ring and the next tick retries. A cycle that finds the
// busy flag set is skipped.
// =============================================================================

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::app_state::AppState;
use crate::feed::fetch_batched;
use crate::market_data::pairs::{display_name, format_price};
use crate::market_data::OrderBookSummary;
use crate::session::PairEvaluation;
use crate::signals::{rank, SignalResult};
use crate::types::{AppMode, ConnectionStatus};

/// What a single cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleOutcome {
    /// Another cycle was in flight, or the pair or timeframe changed
    /// mid-fetch.
    Skipped,
    /// Nothing could be fetched.
    Failed,
    Completed,
}

// ---------------------------------------------------------------------------
// Scheduling
// ---------------------------------------------------------------------------

/// Start the periodic task for the configured mode, replacing any running one.
pub fn start(state: &Arc<AppState>) {
    let mode = state.mode();
    let period = state.runtime_config.read().refresh_interval(mode);
    let s = Arc::clone(state);

    state
        .scheduler
        .start(&format!("{mode}-refresh"), period, move || {
            let s = Arc::clone(&s);
            async move {
                refresh(&s).await;
            }
        });
}

/// Switch to another app variant and restart the refresh task.
pub fn switch_mode(state: &Arc<AppState>, mode: AppMode) {
    let previous = state.mode();
    state.runtime_config.write().mode = mode;
    state.session.write().mode = mode;
    *state.last_evaluation.write() = None;
    *state.order_book.write() = None;
    state.increment_version();

    info!(from = %previous, to = %mode, "mode switched");
    start(state);
}

/// Run one cycle for the current mode.
pub async fn refresh(state: &AppState) -> CycleOutcome {
    match state.mode() {
        AppMode::Overview => run_overview_cycle(state).await,
        AppMode::Advisor | AppMode::DayTrading => run_pair_cycle(state).await,
    }
}

// ---------------------------------------------------------------------------
// Single-pair cycle
// ---------------------------------------------------------------------------

/// Fetch, ingest and evaluate the active pair.
///
/// # Edge cases
/// - Fetch failure => status Disconnected, error recorded, series untouched.
/// - Pair or timeframe switched while the fetch was in flight => the quote
///   is dropped.
/// - Not enough history => evaluation is `Collecting`, no notification.
pub async fn run_pair_cycle(state: &AppState) -> CycleOutcome {
    let Some(_busy) = state.busy.try_begin() else {
        debug!("pair cycle skipped, previous cycle still running");
        return CycleOutcome::Skipped;
    };

    let mode = state.mode();
    let (pair, generation) = {
        let session = state.session.read();
        (session.pair().to_string(), session.generation())
    };

    let ticker = match state.source.fetch_ticker(&pair).await {
        Ok(t) => t,
        Err(e) => {
            warn!(pair = %pair, error = %e, "ticker fetch failed");
            state.set_status(ConnectionStatus::Disconnected, "Error");
            state.push_error(format!("ticker fetch failed: {e}"), Some(&pair));
            return CycleOutcome::Failed;
        }
    };
    let price = ticker.last;

    let (profile, tolerance_pct, depth, notify_every) = {
        let config = state.runtime_config.read();
        (
            config.profile(mode).clone(),
            config.alert_tolerance_pct,
            config.orderbook_depth,
            config.notify_every_signal,
        )
    };

    let (evaluation, view, alert_signal) = {
        let mut session = state.session.write();
        if session.generation() != generation {
            debug!(pair = %pair, "series reset during fetch, dropping quote");
            return CycleOutcome::Skipped;
        }
        let mv = session.ingest(ticker, Utc::now());
        debug!(pair = %pair, price = mv.price, change_pct = mv.change_pct, "tick ingested");

        let evaluation = session.evaluate(&profile);
        let alert_signal = match &evaluation {
            PairEvaluation::Ready(result) => {
                let changed = session.record_signal(result.signal);
                let repeat = notify_every && result.signal.is_actionable();
                (changed || repeat).then(|| result.clone())
            }
            PairEvaluation::Collecting { .. } => None,
        };
        let view = session.view(&evaluation, profile.min_history);
        (evaluation, view, alert_signal)
    };

    *state.last_evaluation.write() = Some(evaluation);
    state.mark_connected();
    state.ports.display.show_pair(&view);

    if let Some(result) = alert_signal {
        if mode == AppMode::Advisor && state.notifications_enabled() {
            notify_signal(state, &pair, &result);
        }
    }

    if mode == AppMode::DayTrading {
        check_alerts(state, &pair, price, tolerance_pct);
        refresh_order_book(state, &pair, depth).await;
    }

    state.increment_version();
    CycleOutcome::Completed
}

fn notify_signal(state: &AppState, pair: &str, result: &SignalResult) {
    let title = format!("{}: {}", display_name(pair), result.signal.label());
    let body = result.signal.recommendation();
    info!(pair = %pair, signal = %result.signal, score = result.score, "signal notification");
    state.ports.notifier.notify(&title, body);
}

fn check_alerts(state: &AppState, pair: &str, price: f64, tolerance_pct: f64) {
    let fired = {
        let mut book = state.alerts.write();
        if book.is_empty() {
            return;
        }
        book.check(pair, price, tolerance_pct)
    };
    if fired.is_empty() {
        return;
    }
    for alert in &fired {
        info!(pair = %alert.pair, target = alert.price, price, id = alert.id, "price alert triggered");
        state.ports.notifier.notify(
            "Price alert",
            &format!(
                "{} reached ¥{} (now ¥{})",
                display_name(&alert.pair),
                format_price(alert.price),
                format_price(price)
            ),
        );
    }
    state.persist_settings();
}

async fn refresh_order_book(state: &AppState, pair: &str, depth: usize) {
    match state.source.fetch_order_book(pair).await {
        Ok(book) => {
            let summary = OrderBookSummary::from_book(pair, &book, depth);
            state.ports.display.show_order_book(&summary);
            *state.order_book.write() = Some(summary);
        }
        Err(e) => {
            warn!(pair = %pair, error = %e, "order book fetch failed");
            state.push_error(format!("order book fetch failed: {e}"), Some(pair));
        }
    }
}

// ---------------------------------------------------------------------------
// Overview cycle
// ---------------------------------------------------------------------------

/// Fetch every tracked pair in batches, extend each history and rank.
///
/// # Edge cases
/// - A failed pair keeps its previous history and is ranked on that.
/// - Every pair failed => status Disconnected, previous report kept.
/// - Pairs below `min_history` are left out of the ranking.
pub async fn run_overview_cycle(state: &AppState) -> CycleOutcome {
    let Some(_busy) = state.busy.try_begin() else {
        debug!("overview cycle skipped, previous cycle still running");
        return CycleOutcome::Skipped;
    };

    let (pairs, batch_size, delay, profile, top_n) = {
        let config = state.runtime_config.read();
        (
            config.pairs.clone(),
            config.overview_batch_size,
            config.overview_batch_delay(),
            config.profile(AppMode::Overview).clone(),
            config.overview_top_n,
        )
    };

    let results = fetch_batched(state.source.as_ref(), &pairs, batch_size, delay).await;

    let mut fetched = 0usize;
    for (pair, ticker) in results {
        if let Some(ticker) = ticker {
            state.record_overview_price(&pair, ticker.last);
            fetched += 1;
        }
    }

    if fetched == 0 && !pairs.is_empty() {
        warn!(pairs = pairs.len(), "overview fetch failed for every pair");
        state.set_status(ConnectionStatus::Disconnected, "Error");
        state.push_error("overview fetch failed for every pair".to_string(), None);
        return CycleOutcome::Failed;
    }

    let history = state.overview_history.snapshot(&pairs);
    let report = rank(
        history.iter().map(|(p, v)| (p.as_str(), v.as_slice())),
        &profile,
        top_n,
    );

    info!(
        fetched,
        tracked = pairs.len(),
        analysed = report.analysed,
        "overview cycle complete"
    );
    state.ports.display.show_overview(&report);
    *state.overview_report.write() = Some(report);

    state.mark_connected();
    state.increment_version();
    CycleOutcome::Completed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_state::test_support::{scripted, state_with};
    use crate::feed::testing::ScriptedSource;
    use crate::feed::{DemoSource, FailoverSource};
    use crate::ports::{RecordingNotifier, SettingsStore};
    use crate::runtime_config::RuntimeConfig;
    use crate::types::Signal;

    fn config(mode: AppMode) -> RuntimeConfig {
        RuntimeConfig {
            mode,
            overview_batch_delay_ms: 0,
            ..RuntimeConfig::default()
        }
    }

    #[tokio::test]
    async fn advisor_collects_then_notifies_on_sell() {
        let (state, notifier, _) = state_with(config(AppMode::Advisor), scripted(&[100.0]));
        state.set_notifications(true);

        for _ in 0..13 {
            assert_eq!(run_pair_cycle(&state).await, CycleOutcome::Completed);
        }
        assert_eq!(
            *state.last_evaluation.read(),
            Some(PairEvaluation::Collecting { have: 13, need: 14 })
        );

        // 14 flat prices: RSI has no full window yet, nothing votes
        run_pair_cycle(&state).await;
        match state.last_evaluation.read().as_ref() {
            Some(PairEvaluation::Ready(r)) => assert_eq!(r.signal, Signal::Hold),
            other => panic!("expected ready, got {other:?}"),
        }
        assert!(notifier.notifications.lock().is_empty());

        // 15th: no losses at all, RSI 100 => overbought => SELL
        run_pair_cycle(&state).await;
        let notes = notifier.notifications.lock().clone();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].0, "Bitcoin: Sell signal");

        // still SELL, no repeat
        run_pair_cycle(&state).await;
        assert_eq!(notifier.notifications.lock().len(), 1);
        assert_eq!(state.status.read().status, ConnectionStatus::Connected);
    }

    #[tokio::test]
    async fn advisor_respects_notification_flag() {
        let (state, notifier, _) = state_with(config(AppMode::Advisor), scripted(&[100.0]));
        for _ in 0..16 {
            run_pair_cycle(&state).await;
        }
        assert_eq!(state.session.read().last_signal(), Some(Signal::Sell));
        assert!(notifier.notifications.lock().is_empty());
    }

    #[tokio::test]
    async fn advisor_repeats_signals_when_configured() {
        let mut cfg = config(AppMode::Advisor);
        cfg.notify_every_signal = true;
        let (state, notifier, _) = state_with(cfg, scripted(&[100.0]));
        state.set_notifications(true);
        assert_eq!(notifier.notifications.lock()[0].0, "Notifications enabled");

        // 14 holds, then SELL on every later cycle
        for _ in 0..17 {
            run_pair_cycle(&state).await;
        }
        let notes = notifier.notifications.lock().clone();
        assert_eq!(notes.len(), 4);
        assert!(notes[1..].iter().all(|(title, _)| title == "Bitcoin: Sell signal"));
    }

    #[tokio::test]
    async fn timeframe_switch_mid_fetch_drops_quote() {
        let source = scripted(&[100.0, 101.0, 102.0]);
        let (state, _, _) = state_with(config(AppMode::DayTrading), source.clone());
        assert_eq!(run_pair_cycle(&state).await, CycleOutcome::Completed);

        for timeframe in ["15m", "15m"] {
            let (entered, release) = source.hold_next_ticker();
            let s = Arc::clone(&state);
            let cycle = tokio::spawn(async move { run_pair_cycle(&s).await });

            entered.notified().await;
            state.select_timeframe(timeframe).unwrap();
            release.notify_one();

            assert_eq!(cycle.await.unwrap(), CycleOutcome::Skipped);
            assert!(state.session.read().series().is_empty());
            assert!(state.last_evaluation.read().is_none());
        }

        assert_eq!(run_pair_cycle(&state).await, CycleOutcome::Completed);
        let session = state.session.read();
        assert_eq!(session.timeframe(), "15m");
        assert_eq!(session.series().len(), 1);
    }

    #[tokio::test]
    async fn fetch_failure_marks_disconnected() {
        let source = Arc::new(ScriptedSource::failing());
        let (state, _, _) = state_with(config(AppMode::DayTrading), source);

        assert_eq!(run_pair_cycle(&state).await, CycleOutcome::Failed);
        assert_eq!(state.status.read().status, ConnectionStatus::Disconnected);
        assert_eq!(state.recent_errors.read().len(), 1);
        assert!(state.session.read().series().is_empty());
    }

    #[tokio::test]
    async fn busy_cycle_is_skipped() {
        let (state, _, _) = state_with(config(AppMode::Advisor), scripted(&[100.0]));
        let guard = state.busy.try_begin();
        assert_eq!(run_pair_cycle(&state).await, CycleOutcome::Skipped);
        drop(guard);
        assert_eq!(run_pair_cycle(&state).await, CycleOutcome::Completed);
    }

    #[tokio::test]
    async fn day_trading_fires_alerts_once_and_loads_book() {
        let source = scripted(&[10_000.0, 10_005.0, 10_050.0]);
        let (state, notifier, store) = state_with(config(AppMode::DayTrading), source);
        state.add_alert("10000").unwrap();
        state.add_alert("10500").unwrap();

        run_pair_cycle(&state).await;
        assert_eq!(notifier.notifications.lock().len(), 1);
        assert_eq!(notifier.notifications.lock()[0].0, "Price alert");

        // 10 005 is within 0.1 % of 10 000, but that alert already fired
        run_pair_cycle(&state).await;
        run_pair_cycle(&state).await;
        assert_eq!(notifier.notifications.lock().len(), 1);

        let saved = store.load().unwrap();
        assert_eq!(saved.alerts.iter().filter(|a| a.triggered).count(), 1);

        let book = state.order_book.read().clone().unwrap();
        assert_eq!(book.best_bid, 99.0);
        assert_eq!(book.best_ask, 101.0);
    }

    #[tokio::test]
    async fn failover_switches_status_to_demo() {
        let live = Arc::new(ScriptedSource::failing());
        let banner_sink = Arc::new(RecordingNotifier::default());
        let source = Arc::new(FailoverSource::new(
            live,
            DemoSource::seeded(11),
            banner_sink.clone(),
            1,
        ));
        let (state, _, _) = state_with(config(AppMode::Advisor), source);

        assert_eq!(run_pair_cycle(&state).await, CycleOutcome::Completed);
        assert_eq!(state.status.read().status, ConnectionStatus::Demo);
        assert_eq!(banner_sink.banners.lock().len(), 1);
        assert!(state.build_snapshot().demo);
    }

    #[tokio::test]
    async fn overview_ranks_after_enough_history() {
        let mut cfg = config(AppMode::Overview);
        cfg.pairs = vec!["btc_jpy".into(), "eth_jpy".into(), "xrp_jpy".into()];
        let source = Arc::new(ScriptedSource::with_prices(&[100.0]));
        source.fail_pair("xrp_jpy");
        let (state, _, _) = state_with(cfg, source);

        for _ in 0..13 {
            run_overview_cycle(&state).await;
        }
        assert_eq!(state.overview_report.read().as_ref().unwrap().analysed, 0);

        run_overview_cycle(&state).await;
        let report = state.overview_report.read().clone().unwrap();
        assert_eq!(report.analysed, 2);
        assert_eq!(state.overview_history.len("xrp_jpy"), 0);
        assert_eq!(state.status.read().status, ConnectionStatus::Connected);
    }

    #[tokio::test]
    async fn overview_total_failure_keeps_previous_report() {
        let mut cfg = config(AppMode::Overview);
        cfg.pairs = vec!["btc_jpy".into()];
        let source = Arc::new(ScriptedSource::with_prices(&[100.0]));
        let (state, _, _) = state_with(cfg, source.clone());

        run_overview_cycle(&state).await;
        assert!(state.overview_report.read().is_some());

        source.fail_pair("btc_jpy");
        assert_eq!(run_overview_cycle(&state).await, CycleOutcome::Failed);
        assert!(state.overview_report.read().is_some());
        assert_eq!(state.status.read().status, ConnectionStatus::Disconnected);
    }

    #[tokio::test]
    async fn switch_mode_restarts_task() {
        let (state, _, _) = state_with(config(AppMode::Overview), scripted(&[100.0]));
        start(&state);
        assert_eq!(state.scheduler.current().as_deref(), Some("overview-refresh"));

        switch_mode(&state, AppMode::DayTrading);
        assert_eq!(state.mode(), AppMode::DayTrading);
        assert_eq!(state.scheduler.current().as_deref(), Some("day_trading-refresh"));
        state.scheduler.stop();
    }
}
