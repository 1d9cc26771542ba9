use super::*;
use crate::bridge::memory::MemoryBridge;
use crate::bridge::{BridgeError, MockLightBridge};
use crate::constants::test_constants::*;
use crate::rules::{
    Condition, DaySet, LightState, LocationConfig, Rule, SolarEventKind, TimeTrigger,
};
use crate::time_source::SimulatedTimeSource;
use chrono::{TimeZone, Weekday};
use chrono_tz::Tz;
use mockall::predicate::eq;

fn san_francisco() -> LocationConfig {
    let tz: Tz = TEST_TIMEZONE.parse().unwrap();
    LocationConfig::new(tz, TEST_LATITUDE, TEST_LONGITUDE).unwrap()
}

fn local(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    san_francisco()
        .timezone
        .with_ymd_and_hms(y, m, d, h, min, 0)
        .unwrap()
        .with_timezone(&Utc)
}

fn rule(groups: &[&str], trigger: TimeTrigger, brightness: u8) -> Rule {
    Rule {
        days: DaySet::every_day(),
        light_groups: groups.iter().map(|g| g.to_string()).collect(),
        trigger,
        target_state: LightState::new(brightness).unwrap(),
        conditions: Vec::new(),
    }
}

fn at(time: &str) -> TimeTrigger {
    TimeTrigger::FixedLocalTime(time.parse().unwrap())
}

fn longyearbyen() -> LocationConfig {
    LocationConfig::new(chrono_tz::Arctic::Longyearbyen, 78.22, 15.65).unwrap()
}

fn create_core<B: LightBridge>(
    bridge: B,
    rules: Vec<Rule>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Core<B> {
    create_core_at(san_francisco(), bridge, rules, start, end)
}

fn create_core_at<B: LightBridge>(
    location: LocationConfig,
    bridge: B,
    rules: Vec<Rule>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Core<B> {
    Core::new(CoreParams {
        bridge,
        scheduler: Scheduler::new(location, rules),
        time_source: Arc::new(SimulatedTimeSource::new(start, end)),
        debug_enabled: true,
    })
}

fn named_mock() -> MockLightBridge {
    let mut bridge = MockLightBridge::new();
    bridge.expect_bridge_name().return_const("mock");
    bridge
}

#[test]
fn test_fixed_rule_fires_once_in_window() {
    let bridge = MemoryBridge::with_groups([TEST_GROUP], LightState::new(70).unwrap());
    let mut core = create_core(
        bridge,
        vec![rule(&[TEST_GROUP], at("22:00"), 0)],
        local(2024, 6, 21, 21, 0),
        local(2024, 6, 21, 23, 0),
    );

    core.execute().unwrap();

    let applied = core.bridge().applied();
    assert_eq!(applied.len(), 1);
    assert_eq!(applied[0].group, TEST_GROUP);
    assert_eq!(applied[0].state, LightState::off());
    assert_eq!(core.applied_count(), 1);
}

#[test]
fn test_sunset_rule_with_lights_on_condition_applies() {
    let dim = LightState::new(40).unwrap();
    let mut bridge = named_mock();
    bridge
        .expect_get_group_light_state()
        .with(eq(TEST_GROUP))
        .times(1)
        .returning(move |_| Ok(dim));
    bridge
        .expect_set_group_light_state()
        .with(eq(TEST_GROUP), eq(dim))
        .times(1)
        .returning(|_, _| Ok(()));

    let mut sunset = rule(&[TEST_GROUP], TimeTrigger::SolarEvent(SolarEventKind::Sunset), 40);
    sunset.conditions = vec![Condition::LightsAreOn];

    let mut core = create_core(
        bridge,
        vec![sunset],
        local(2024, 6, 21, 12, 0),
        local(2024, 6, 21, 23, 59),
    );

    core.execute().unwrap();
    assert_eq!(core.applied_count(), 1);
}

#[test]
fn test_condition_read_error_stops_before_set() {
    let mut bridge = named_mock();
    bridge
        .expect_get_group_light_state()
        .times(1)
        .returning(|_| Err(BridgeError::Transport("connection refused".to_string())));
    bridge.expect_set_group_light_state().times(0);

    let mut guarded = rule(&[TEST_GROUP], at("22:00"), 0);
    guarded.conditions = vec![Condition::LightsAreOn];

    let mut core = create_core(
        bridge,
        vec![guarded],
        local(2024, 6, 21, 21, 0),
        local(2024, 6, 23, 0, 0),
    );

    let err = core.execute().unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("Failed to evaluate conditions"));
    assert!(message.contains("connection refused"));
}

#[test]
fn test_set_error_is_fatal() {
    let mut bridge = named_mock();
    bridge
        .expect_set_group_light_state()
        .times(1)
        .returning(|group, _| Err(BridgeError::UnknownGroup(group.to_string())));

    let mut core = create_core(
        bridge,
        vec![rule(&["Attic"], at("22:00"), 0), rule(&[TEST_GROUP], at("23:00"), 0)],
        local(2024, 6, 21, 21, 0),
        local(2024, 6, 23, 0, 0),
    );

    let err = core.execute().unwrap_err();
    assert!(format!("{err:#}").contains("Attic"));
}

#[test]
fn test_unsatisfied_group_is_skipped_and_next_group_applied() {
    let mut bridge =
        MemoryBridge::with_groups([TEST_GROUP, TEST_SECOND_GROUP], LightState::off());
    bridge.set_initial_state(TEST_GROUP, LightState::new(80).unwrap());

    let mut morning = rule(&[TEST_GROUP, TEST_SECOND_GROUP], at("07:00"), 60);
    morning.conditions = vec![Condition::LightsAreOff];

    let mut core = create_core(
        bridge,
        vec![morning],
        local(2024, 6, 21, 6, 0),
        local(2024, 6, 21, 8, 0),
    );
    core.execute().unwrap();

    let applied = core.bridge().applied();
    assert_eq!(applied.len(), 1);
    assert_eq!(applied[0].group, TEST_SECOND_GROUP);
    assert_eq!(core.skipped_count(), 1);
    assert_eq!(core.applied_count(), 1);
}

#[test]
fn test_fire_applies_and_skips_per_group() {
    let mut bridge =
        MemoryBridge::with_groups([TEST_GROUP, TEST_SECOND_GROUP], LightState::off());
    bridge.set_initial_state(TEST_SECOND_GROUP, LightState::new(10).unwrap());

    let mut evening = rule(&[TEST_GROUP, TEST_SECOND_GROUP], at("20:00"), 50);
    evening.conditions = vec![Condition::LightsAreOff];
    let action = ScheduledAction {
        rule: evening.clone(),
        scheduled_for: san_francisco()
            .timezone
            .with_ymd_and_hms(2024, 6, 21, 20, 0, 0)
            .unwrap(),
    };

    let start = local(2024, 6, 21, 20, 0);
    let mut core = create_core(bridge, vec![evening], start, start);

    core.fire(&action).unwrap();

    assert_eq!((core.applied_count(), core.skipped_count()), (1, 1));
    let applied = core.bridge().applied();
    assert_eq!(applied.len(), 1);
    assert_eq!(applied[0].group, TEST_GROUP);
    assert_eq!(applied[0].state, LightState::new(50).unwrap());
}

#[test]
fn test_polar_night_sunrise_rule_never_fires() {
    let bridge = MemoryBridge::with_groups([TEST_GROUP], LightState::off());
    let start = Utc.with_ymd_and_hms(2024, 12, 15, 12, 0, 0).unwrap();
    let mut core = create_core_at(
        longyearbyen(),
        bridge,
        vec![rule(&[TEST_GROUP], TimeTrigger::SolarEvent(SolarEventKind::Sunrise), 60)],
        start,
        start + Duration::days(3),
    );

    core.execute().unwrap();

    assert!(core.bridge().applied().is_empty());
    assert_eq!(core.applied_count(), 0);
}

#[test]
fn test_polar_night_keeps_fixed_rules_running() {
    let bridge = MemoryBridge::with_groups([TEST_GROUP, TEST_SECOND_GROUP], LightState::off());
    let start = Utc.with_ymd_and_hms(2024, 12, 15, 12, 0, 0).unwrap();
    let mut core = create_core_at(
        longyearbyen(),
        bridge,
        vec![
            rule(&[TEST_GROUP], TimeTrigger::SolarEvent(SolarEventKind::Sunset), 40),
            rule(&[TEST_SECOND_GROUP], at("22:00"), 10),
        ],
        start,
        start + Duration::days(3),
    );

    core.execute().unwrap();

    let applied = core.bridge().applied();
    assert_eq!(applied.len(), 3);
    assert!(applied.iter().all(|a| a.group == TEST_SECOND_GROUP));
}

#[test]
fn test_daily_rule_fires_every_day() {
    let bridge = MemoryBridge::with_groups([TEST_GROUP], LightState::off());
    let mut core = create_core(
        bridge,
        vec![rule(&[TEST_GROUP], at("22:00"), 0)],
        local(2024, 6, 21, 12, 0),
        local(2024, 6, 24, 12, 0),
    );

    core.execute().unwrap();
    assert_eq!(core.bridge().applied().len(), 3);
}

#[test]
fn test_weekly_rule_does_not_hold_back_daily_rule() {
    let bridge = MemoryBridge::with_groups([TEST_GROUP, TEST_SECOND_GROUP], LightState::off());
    let mut weekly = rule(&[TEST_SECOND_GROUP], at("07:00"), 100);
    weekly.days = [Weekday::Mon].into_iter().collect();

    // Friday noon to the following Friday noon
    let mut core = create_core(
        bridge,
        vec![rule(&[TEST_GROUP], at("22:00"), 0), weekly],
        local(2024, 6, 21, 12, 0),
        local(2024, 6, 28, 12, 0),
    );
    core.execute().unwrap();

    let applied = core.bridge().applied();
    let daily = applied.iter().filter(|a| a.group == TEST_GROUP).count();
    let weekly = applied.iter().filter(|a| a.group == TEST_SECOND_GROUP).count();
    assert_eq!(daily, 7);
    assert_eq!(weekly, 1);
}

#[test]
fn test_same_instant_rules_fire_in_configured_order() {
    let bridge = MemoryBridge::with_groups([TEST_GROUP], LightState::off());
    let mut core = create_core(
        bridge,
        vec![
            rule(&[TEST_GROUP], at("21:30"), 20),
            rule(&[TEST_GROUP], at("21:30"), 90),
        ],
        local(2024, 6, 21, 21, 0),
        local(2024, 6, 21, 22, 0),
    );
    core.execute().unwrap();

    let states: Vec<u8> = core
        .bridge()
        .applied()
        .iter()
        .map(|a| a.state.brightness_percent())
        .collect();
    assert_eq!(states, vec![20, 90]);
    assert_eq!(
        core.bridge().get_group_light_state(TEST_GROUP).unwrap(),
        LightState::new(90).unwrap()
    );
}

#[test]
fn test_no_rules_is_an_error() {
    let bridge = MemoryBridge::default();
    let start = local(2024, 6, 21, 12, 0);
    let mut core = create_core(bridge, Vec::new(), start, start + Duration::days(1));

    assert!(core.execute().is_err());
}

#[test]
fn test_time_until_never_negative() {
    let now = local(2024, 6, 21, 12, 0);
    assert_eq!(time_until(now, now - Duration::minutes(5)), StdDuration::ZERO);
    assert_eq!(
        time_until(now, now + Duration::minutes(5)),
        StdDuration::from_secs(300)
    );
}

#[test]
fn test_format_wait() {
    assert_eq!(format_wait(StdDuration::from_secs(42)), "42s");
    assert_eq!(format_wait(StdDuration::from_secs(125)), "2m 5s");
    assert_eq!(format_wait(StdDuration::from_secs(3 * 3600 + 60 * 7)), "3h 7m");
}
