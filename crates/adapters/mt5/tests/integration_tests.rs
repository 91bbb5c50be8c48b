//! Integration tests for the MT5 adapter.

use mt5_adapter::testing::{
    connected_terminal, eurusd, eurusd_tick, long_position, real_account, result_with_retcode,
    MockTerminal,
};
use mt5_adapter::{
    CallValue, ErrorCode, Mt5Client, Mt5Config, Mt5Error, Order, PriceBasis, RatesWindow,
    ReturnMode, Timeframe, Trade, TradeRetcode,
};

fn raising_config() -> Mt5Config {
    Mt5Config {
        raise_on_errors: true,
        ..Default::default()
    }
}

#[test]
fn test_session_restores_state_on_drop() {
    let mut client = Mt5Client::new(MockTerminal::default());
    let config = Mt5Config {
        raise_on_errors: true,
        debug_logging: true,
        return_mode: ReturnMode::Native,
        ..Default::default()
    };

    let session = client.connect(&config).unwrap();
    assert!(session.state().raise_on_errors);
    assert!(session.state().debug_logging);
    assert_eq!(session.state().return_mode, ReturnMode::Native);
    drop(session);

    assert!(!client.state().raise_on_errors);
    assert!(!client.state().debug_logging);
    assert_eq!(client.state().return_mode, ReturnMode::Raw);

    let mock = client.into_inner();
    assert_eq!(mock.shutdown_count, 1);
}

#[test]
fn test_connect_failure_shuts_down_and_restores() {
    let mut mock = MockTerminal::default();
    mock.initialize_ok = false;
    mock.set_last_error(-10_003, "IPC initialization failed");
    let mut client = Mt5Client::new(mock);

    let err = client.connect(&raising_config()).unwrap_err();
    match err {
        Mt5Error::ConnectionInitFailed { code, .. } => {
            assert_eq!(code, ErrorCode::InternalFailInit);
        }
        other => panic!("expected init failure, got {other:?}"),
    }

    assert!(!client.state().raise_on_errors);
    assert_eq!(client.into_inner().shutdown_count, 1);
}

#[test]
fn test_real_account_gate() {
    let mut mock = MockTerminal::default();
    mock.account = Some(real_account());
    let mut client = Mt5Client::new(mock);

    let err = client.connect(&raising_config()).unwrap_err();
    assert!(matches!(err, Mt5Error::RealAccountDisabled));
    assert_eq!(err.code(), ErrorCode::RealAccountDisabled);
    assert!(!client.state().raise_on_errors);

    let config = Mt5Config {
        enable_real_trading: true,
        ..raising_config()
    };
    assert!(client.connect(&config).is_ok());

    // One shutdown from the rejected session, one from the accepted one.
    assert_eq!(client.into_inner().shutdown_count, 2);
}

#[test]
fn test_auto_trading_gate() {
    let mut terminal = connected_terminal();
    terminal.trade_allowed = false;
    let mut mock = MockTerminal::default();
    mock.terminal = Some(terminal);
    let mut client = Mt5Client::new(mock);

    let config = Mt5Config {
        ensure_trade_enabled: true,
        ..Default::default()
    };
    let err = client.connect(&config).unwrap_err();
    assert!(matches!(err, Mt5Error::AutoTradingDisabled));

    // Without the gate the same terminal connects fine.
    assert!(client.connect(&Mt5Config::default()).is_ok());
}

#[test]
fn test_unavailable_account_fails_connect() {
    let mut mock = MockTerminal::default();
    mock.account = None;
    mock.set_last_error(-10_004, "no IPC connection");
    let mut client = Mt5Client::new(mock);

    let err = client.connect(&Mt5Config::default()).unwrap_err();
    match err {
        Mt5Error::VendorCallFailed { code, .. } => {
            assert_eq!(code, ErrorCode::InternalFailConn);
        }
        other => panic!("expected vendor failure, got {other:?}"),
    }
    assert_eq!(client.into_inner().shutdown_count, 1);
}

#[test]
fn test_terminal_bar_limit_cached_and_applied() {
    let mut terminal = connected_terminal();
    terminal.maxbars = 5000;
    let mut mock = MockTerminal::default();
    mock.terminal = Some(terminal);
    let mut client = Mt5Client::new(mock);

    let mut session = client.connect(&Mt5Config::default()).unwrap();
    assert_eq!(session.state().max_bars, 5000);

    session
        .copy_rates_from_pos("EURUSD", Timeframe::H1, 0, 100_000)
        .unwrap();
    drop(session);

    let mock = client.into_inner();
    match mock.last_rates_window {
        Some(RatesWindow::FromPos { count, .. }) => assert_eq!(count, 4999),
        other => panic!("expected a clamped position window, got {other:?}"),
    }
}

#[test]
fn test_zero_totals_never_raise() {
    let mut mock = MockTerminal::default();
    // A stale non-OK error from an earlier call must not turn a legitimate
    // zero count into a failure.
    mock.set_last_error(ErrorCode::Fail.code(), "generic fail from a prior call");
    let mut client = Mt5Client::new(mock);
    let mut session = client.connect(&raising_config()).unwrap();

    assert_eq!(session.symbols_total().unwrap(), Some(0));
    assert_eq!(session.orders_total().unwrap(), Some(0));
    assert_eq!(session.positions_total().unwrap(), Some(0));

    let now = chrono::Utc::now();
    let earlier = now - chrono::Duration::days(30);
    assert_eq!(session.history_orders_total(earlier, now).unwrap(), Some(0));
    assert_eq!(session.history_deals_total(earlier, now).unwrap(), Some(0));
}

#[test]
fn test_raise_toggle_mid_session() {
    let mut mock = MockTerminal::default();
    mock.set_last_error(ErrorCode::NotFound.code(), "symbol not found");
    let mut client = Mt5Client::new(mock);
    let mut session = client.connect(&Mt5Config::default()).unwrap();

    // Raising disabled: absence passes through untouched.
    assert!(session.symbol_info("UNKNOWN").unwrap().is_none());

    session.set_raise_on_errors(true);
    let err = session.symbol_info("UNKNOWN").unwrap_err();
    match err {
        Mt5Error::VendorCallFailed { code, .. } => assert_eq!(code, ErrorCode::NotFound),
        other => panic!("expected vendor failure, got {other:?}"),
    }

    session.set_raise_on_errors(false);
    assert!(session.symbol_info("UNKNOWN").unwrap().is_none());
}

#[test]
fn test_empty_history_is_not_an_error() {
    let mut client = Mt5Client::new(MockTerminal::default());
    let mut session = client.connect(&raising_config()).unwrap();

    let orders = session
        .history_orders_get(&mt5_adapter::HistorySelect::default())
        .unwrap();
    assert!(orders.is_empty());
}

#[test]
fn test_failed_history_raises_when_enabled() {
    let mut mock = MockTerminal::default();
    mock.history_unavailable = true;
    mock.set_last_error(ErrorCode::Fail.code(), "history select failed");
    let mut client = Mt5Client::new(mock);
    let mut session = client.connect(&raising_config()).unwrap();

    let err = session
        .history_orders_get(&mt5_adapter::HistorySelect::default())
        .unwrap_err();
    assert!(matches!(err, Mt5Error::VendorCallFailed { .. }));

    // The same absence with raising off is just an empty result.
    session.set_raise_on_errors(false);
    let orders = session
        .history_orders_get(&mt5_adapter::HistorySelect::default())
        .unwrap();
    assert!(orders.is_empty());
}

#[test]
fn test_nested_session_restores_outer_state() {
    let mut client = Mt5Client::new(MockTerminal::default());
    let mut outer = client.connect(&raising_config()).unwrap();
    assert!(outer.state().raise_on_errors);

    {
        let inner = outer.connect(&Mt5Config::default()).unwrap();
        assert!(!inner.state().raise_on_errors);
    }

    assert!(outer.state().raise_on_errors);
}

#[test]
fn test_symbols_get_diagnoses_outdated_build() {
    let mut terminal = connected_terminal();
    terminal.build = 2000;
    let mut mock = MockTerminal::default();
    mock.terminal = Some(terminal);
    mock.symbols_unavailable = true;
    let mut client = Mt5Client::new(mock);
    let mut session = client.connect(&raising_config()).unwrap();

    let err = session.symbols_get(None).unwrap_err();
    assert_eq!(err.code(), ErrorCode::TerminalVersionOutdated);
}

#[test]
fn test_symbols_get_diagnoses_silent_failure() {
    let mut mock = MockTerminal::default();
    mock.symbols_unavailable = true;
    let mut client = Mt5Client::new(mock);
    let mut session = client.connect(&raising_config()).unwrap();

    let err = session.symbols_get(None).unwrap_err();
    assert_eq!(err.code(), ErrorCode::UnknownError);
    assert!(err.to_string().contains("Is the terminal connected?"));

    // With raising off the same condition degrades to an empty result.
    session.set_raise_on_errors(false);
    assert!(session.symbols_get(None).unwrap().is_empty());
}

#[test]
fn test_symbols_get_group_and_predicate() {
    let mut other = eurusd();
    other.name = "GBPJPY".to_string();
    let mut mock = MockTerminal::default();
    mock.symbols = vec![eurusd(), other];
    let mut client = Mt5Client::new(mock);
    let mut session = client.connect(&Mt5Config::default()).unwrap();

    let usd = session.symbols_get(Some("*USD*")).unwrap();
    assert_eq!(usd.len(), 1);
    assert_eq!(usd[0].name, "EURUSD");

    let five_digit = session
        .symbols_get_where(None, |s| s.digits == 5)
        .unwrap();
    assert_eq!(five_digit.len(), 2);
}

#[test]
fn test_market_order_priced_from_tick() {
    let mut mock = MockTerminal::default();
    mock.symbols = vec![eurusd()];
    mock.ticks = vec![eurusd_tick()];
    let mut client = Mt5Client::new(mock);
    let mut session = client.connect(&Mt5Config::default()).unwrap();

    let result = Order::buy("EURUSD", 0.5)
        .send(&mut session)
        .unwrap()
        .unwrap();
    assert_eq!(result.retcode, TradeRetcode::Done as u32);
    assert_eq!(result.request.price, Some(1.105_08));
    assert_eq!(result.request.volume, Some(0.5));
}

#[test]
fn test_trading_helpers_refuse_converted_output() {
    let mut client = Mt5Client::new(MockTerminal::default());
    let config = Mt5Config {
        return_mode: ReturnMode::Dict,
        ..Default::default()
    };
    let mut session = client.connect(&config).unwrap();

    let err = Order::buy("EURUSD", 0.5).send(&mut session).unwrap_err();
    assert!(matches!(err, Mt5Error::Unsupported(_)));

    let trade = Trade::new("EURUSD", 7);
    let err = trade.buy(&mut session, 0.5).unwrap_err();
    assert!(matches!(err, Mt5Error::Unsupported(_)));

    // Back in raw mode the same call goes through.
    session.set_return_mode(ReturnMode::Raw);
    assert!(Order::buy("EURUSD", 0.5).price(1.1).send(&mut session).is_ok());
}

#[test]
fn test_trade_retries_through_requotes() {
    let mut mock = MockTerminal::default();
    mock.ticks = vec![eurusd_tick()];
    mock.push_order_result(result_with_retcode(TradeRetcode::Requote as u32));
    mock.push_order_result(result_with_retcode(TradeRetcode::PriceOff as u32));
    let mut client = Mt5Client::new(mock);
    let mut session = client.connect(&Mt5Config::default()).unwrap();

    let trade = Trade::new("EURUSD", 7);
    let result = trade.buy(&mut session, 1.0).unwrap().unwrap();
    assert_eq!(result.retcode, TradeRetcode::Done as u32);
    drop(session);

    assert_eq!(client.into_inner().called("order_send"), 3);
}

#[test]
fn test_trade_rejection_is_final() {
    let mut mock = MockTerminal::default();
    mock.ticks = vec![eurusd_tick()];
    mock.push_order_result(result_with_retcode(TradeRetcode::NoMoney as u32));
    let mut client = Mt5Client::new(mock);
    let mut session = client.connect(&Mt5Config::default()).unwrap();

    let trade = Trade::new("EURUSD", 7);
    let result = trade.buy(&mut session, 1.0).unwrap().unwrap();
    assert_eq!(result.retcode, TradeRetcode::NoMoney as u32);
    drop(session);

    assert_eq!(client.into_inner().called("order_send"), 1);
}

#[test]
fn test_trade_position_matches_magic() {
    let mut mock = MockTerminal::default();
    mock.positions = vec![long_position(1, 7), long_position(2, 9)];
    let mut client = Mt5Client::new(mock);
    let mut session = client.connect(&Mt5Config::default()).unwrap();

    let trade = Trade::new("EURUSD", 7);
    let position = trade.position(&mut session).unwrap().unwrap();
    assert_eq!(position.ticket, 1);

    let unmatched = Trade::new("EURUSD", 99);
    assert!(unmatched.position(&mut session).unwrap().is_none());
}

#[test]
fn test_modify_sltp_by_ticks_from_open_price() {
    let mut mock = MockTerminal::default();
    mock.symbols = vec![eurusd()];
    mock.positions = vec![long_position(1, 7)];
    let mut client = Mt5Client::new(mock);
    let mut session = client.connect(&Mt5Config::default()).unwrap();

    let trade = Trade::new("EURUSD", 7);
    let result = trade
        .modify_sltp_by_ticks(&mut session, Some(100), Some(200), PriceBasis::Open)
        .unwrap()
        .unwrap();

    // Long position opened at 1.10000 with a 0.00001 tick size: stop 100
    // ticks below, target 200 ticks above.
    let sl = result.request.sl.unwrap();
    let tp = result.request.tp.unwrap();
    assert!((sl - 1.099_00).abs() < 1e-9, "sl was {sl}");
    assert!((tp - 1.102_00).abs() < 1e-9, "tp was {tp}");
}

#[test]
fn test_render_follows_session_return_mode() {
    let mut client = Mt5Client::new(MockTerminal::default());
    let config = Mt5Config {
        return_mode: ReturnMode::Native,
        ..Default::default()
    };
    let mut session = client.connect(&config).unwrap();

    let account = session.account_info().unwrap().unwrap();
    let rendered = session.render_record(&account);
    match rendered {
        CallValue::Map(map) => assert!(map.contains_key("login")),
        other => panic!("expected a plain map, got {other:?}"),
    }
}

#[test]
fn test_render_series_and_list_follow_return_mode() {
    let mut client = Mt5Client::new(MockTerminal::default());
    let config = Mt5Config {
        return_mode: ReturnMode::Dict,
        ..Default::default()
    };
    let mut session = client.connect(&config).unwrap();

    // Dict mode keeps the series wrapper but converts its members.
    let ticks = vec![eurusd_tick()];
    let rendered = session.render_series(&ticks);
    assert!(!rendered.contains_record());
    match &rendered {
        CallValue::Series(items) => assert!(matches!(items[0], CallValue::Map(_))),
        other => panic!("expected series, got {other:?}"),
    }

    session.set_return_mode(ReturnMode::Native);
    match session.render_series(&ticks) {
        CallValue::List(items) => assert!(matches!(items[0], CallValue::Map(_))),
        other => panic!("expected list, got {other:?}"),
    }
    match session.render_list(&[long_position(1, 7)]) {
        CallValue::List(items) => assert!(matches!(items[0], CallValue::Map(_))),
        other => panic!("expected list, got {other:?}"),
    }
}

#[test]
fn test_ping_reports_terminal_latency() {
    let mut client = Mt5Client::new(MockTerminal::default());
    let mut session = client.connect(&Mt5Config::default()).unwrap();

    let (elapsed_ms, ping_last) = session.ping().unwrap();
    assert!(elapsed_ms >= 0.0);
    assert_eq!(ping_last, 40_000);
}

#[test]
fn test_login_and_version() {
    let mut client = Mt5Client::new(MockTerminal::default());
    let mut session = client.connect(&Mt5Config::default()).unwrap();

    assert!(session.login(654_321, "secret", "Broker-Demo", None).unwrap());
    let (major, build, _) = session.version().unwrap().unwrap();
    assert_eq!(major, 5);
    assert_eq!(build, 2375);
}

#[test]
#[tracing_test::traced_test]
fn test_order_logging_both_sides() {
    let mut mock = MockTerminal::default();
    mock.ticks = vec![eurusd_tick()];
    let mut client = Mt5Client::new(mock);
    let mut session = client.connect(&Mt5Config::default()).unwrap();

    Order::buy("EURUSD", 0.5).send(&mut session).unwrap();
    assert!(logs_contain("order_request"));
    assert!(logs_contain("order_response"));
    assert!(!logs_contain("order_fail"));
}

#[test]
#[tracing_test::traced_test]
fn test_rejected_order_logs_failure() {
    let mut mock = MockTerminal::default();
    mock.ticks = vec![eurusd_tick()];
    mock.push_order_result(result_with_retcode(TradeRetcode::NoMoney as u32));
    let mut client = Mt5Client::new(mock);
    let mut session = client.connect(&Mt5Config::default()).unwrap();

    Order::buy("EURUSD", 0.5).send(&mut session).unwrap();
    assert!(logs_contain("order_fail"));
    assert!(logs_contain("TRADE_RETCODE_NO_MONEY"));
}

#[test]
#[tracing_test::traced_test]
fn test_debug_logging_emits_call_events() {
    let mut client = Mt5Client::new(MockTerminal::default());
    let config = Mt5Config {
        debug_logging: true,
        ..Default::default()
    };
    let mut session = client.connect(&config).unwrap();

    session.symbols_total().unwrap();
    assert!(logs_contain("function_debugging"));
    assert!(logs_contain("symbols_total"));
}

#[test]
fn test_connected_terminal_snapshot() {
    let mut client = Mt5Client::new(MockTerminal::default());
    let session = client.connect(&Mt5Config::default()).unwrap();

    let terminal = session.connected_terminal().unwrap();
    assert!(terminal.connected);
    assert_eq!(terminal.maxbars, 100_000);
}
