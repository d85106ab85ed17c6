use std::sync::Once;

use shorts_core::{
    update, validate_range, BoundState, ChannelRef, Effect, Msg, OrchestrationError,
    OrchestrationState, RangeSelection, RangeStatus,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

fn discovery_seq(effects: &[Effect]) -> u64 {
    effects
        .iter()
        .find_map(|effect| match effect {
            Effect::DiscoverBound { seq, .. } => Some(*seq),
            _ => None,
        })
        .expect("discover effect")
}

#[test]
fn channel_change_issues_exactly_one_lookup() {
    init_logging();
    let (mut state, effects) = update(
        OrchestrationState::new(),
        Msg::ChannelChanged("  https://www.youtube.com/@someone/shorts ".to_string()),
    );

    assert_eq!(
        effects,
        vec![Effect::DiscoverBound {
            seq: 1,
            channel: ChannelRef::parse("https://www.youtube.com/@someone/shorts").unwrap(),
            range: RangeSelection::new(0, 10),
        }]
    );
    assert_eq!(state.bound(), &BoundState::Pending { stale: None });
    assert!(state.view().validating);
    assert!(state.consume_dirty());

    // Same channel again is not a change.
    let (_state, effects) = update(
        state,
        Msg::ChannelChanged("https://www.youtube.com/@someone/shorts".to_string()),
    );
    assert!(effects.is_empty());
}

#[test]
fn only_latest_lookup_is_applied() {
    init_logging();
    let (state, first) = update(OrchestrationState::new(), Msg::ChannelChanged("a".into()));
    let (state, second) = update(state, Msg::ChannelChanged("b".into()));
    let first_seq = discovery_seq(&first);
    let second_seq = discovery_seq(&second);
    assert!(second_seq > first_seq);

    // Second lookup resolves first, then the superseded one arrives late.
    let (state, _) = update(
        state,
        Msg::BoundDiscovered {
            seq: second_seq,
            result: Ok(12),
        },
    );
    let (mut state, effects) = update(
        state,
        Msg::BoundDiscovered {
            seq: first_seq,
            result: Ok(3),
        },
    );

    assert!(effects.is_empty());
    assert_eq!(state.bound(), &BoundState::Resolved(12));
    assert_eq!(state.channel().map(ChannelRef::as_str), Some("b"));
    assert!(state.consume_dirty());
}

#[test]
fn superseded_result_arriving_before_latest_is_dropped() {
    init_logging();
    let (state, first) = update(OrchestrationState::new(), Msg::ChannelChanged("a".into()));
    let (mut state, second) = update(state, Msg::ChannelChanged("b".into()));
    assert!(state.consume_dirty());

    let (mut state, _) = update(
        state,
        Msg::BoundDiscovered {
            seq: discovery_seq(&first),
            result: Ok(3),
        },
    );
    assert!(state.bound().is_pending());
    assert!(!state.consume_dirty());

    let (state, _) = update(
        state,
        Msg::BoundDiscovered {
            seq: discovery_seq(&second),
            result: Ok(7),
        },
    );
    assert_eq!(state.bound().resolved(), Some(7));
}

#[test]
fn resolved_bound_clamps_end() {
    init_logging();
    let (state, effects) = update(OrchestrationState::new(), Msg::ChannelChanged("c".into()));
    let (state, _) = update(state, Msg::EndChanged(25));
    let (state, _) = update(
        state,
        Msg::BoundDiscovered {
            seq: discovery_seq(&effects),
            result: Ok(12),
        },
    );

    assert_eq!(state.range(), RangeSelection::new(0, 12));
    assert_eq!(state.range_status(), RangeStatus::Valid);
}

#[test]
fn resolved_bound_keeps_end_inside_bound() {
    let (state, effects) = update(OrchestrationState::new(), Msg::ChannelChanged("c".into()));
    let (state, _) = update(
        state,
        Msg::BoundDiscovered {
            seq: discovery_seq(&effects),
            result: Ok(12),
        },
    );

    assert_eq!(state.range(), RangeSelection::new(0, 10));
}

#[test]
fn failed_lookup_surfaces_error_and_keeps_old_count_stale() {
    init_logging();
    let (state, effects) = update(OrchestrationState::new(), Msg::ChannelChanged("a".into()));
    let (state, _) = update(
        state,
        Msg::BoundDiscovered {
            seq: discovery_seq(&effects),
            result: Ok(12),
        },
    );

    let (state, effects) = update(state, Msg::ChannelChanged("broken".into()));
    assert_eq!(state.bound(), &BoundState::Pending { stale: Some(12) });
    assert_eq!(state.bound().resolved(), None);

    let (state, _) = update(
        state,
        Msg::BoundDiscovered {
            seq: discovery_seq(&effects),
            result: Err("No Shorts URLs found.".into()),
        },
    );

    assert_eq!(
        state.bound(),
        &BoundState::Failed {
            stale: Some(12),
            message: "No Shorts URLs found.".into(),
        }
    );
    assert_eq!(state.bound().resolved(), None);
    assert_eq!(state.range_status(), RangeStatus::Unvalidated);
    assert_eq!(
        state.last_error(),
        Some(&OrchestrationError::Discovery("No Shorts URLs found.".into()))
    );

    // Editing the channel again clears the lookup error.
    let (state, _) = update(state, Msg::ChannelChanged("fixed".into()));
    assert_eq!(state.last_error(), None);
}

#[test]
fn blank_channel_clears_bound_and_orphans_lookup() {
    init_logging();
    let (state, effects) = update(OrchestrationState::new(), Msg::ChannelChanged("a".into()));
    let (state, cleared) = update(state, Msg::ChannelChanged("   ".into()));
    assert!(cleared.is_empty());
    assert_eq!(state.channel(), None);
    assert_eq!(state.bound(), &BoundState::Unset);

    let (state, _) = update(
        state,
        Msg::BoundDiscovered {
            seq: discovery_seq(&effects),
            result: Ok(9),
        },
    );
    assert_eq!(state.bound(), &BoundState::Unset);
}

#[test]
fn range_status_reports_each_violation() {
    assert_eq!(
        validate_range(RangeSelection::new(4, 4), Some(10), 30),
        RangeStatus::Empty
    );
    assert_eq!(
        validate_range(RangeSelection::new(0, 40), Some(5), 30),
        RangeStatus::ExceedsCap { cap: 30 }
    );
    assert_eq!(
        validate_range(RangeSelection::new(0, 8), Some(5), 30),
        RangeStatus::ExceedsBound { bound: 5 }
    );
    assert_eq!(
        validate_range(RangeSelection::new(0, 8), None, 30),
        RangeStatus::Unvalidated
    );
    assert_eq!(
        validate_range(RangeSelection::new(2, 5), Some(5), 30),
        RangeStatus::Valid
    );
}
