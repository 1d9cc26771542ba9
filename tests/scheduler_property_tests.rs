use chrono::{DateTime, Duration, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use lightrules::core::Scheduler;
use lightrules::logger::Log;
use lightrules::rules::{DaySet, LightState, LocationConfig, Rule, TimeTrigger};
use proptest::prelude::*;

const TIMEZONES: [&str; 4] = [
    "America/Los_Angeles",
    "Europe/Berlin",
    "Australia/Sydney",
    "Asia/Kolkata",
];

/// Generate a fixed-time rule; brightness doubles as the rule's identity
fn fixed_rule_strategy() -> impl Strategy<Value = (u32, u32)> {
    (0u32..24, 0u32..60)
}

/// Generate an instant anywhere in 2024, which covers every DST change
fn instant_strategy() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..(366 * 24 * 60)).prop_map(|minutes| {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes)
    })
}

fn build_rules(times: &[(u32, u32)]) -> Vec<Rule> {
    times
        .iter()
        .enumerate()
        .map(|(index, (hour, minute))| Rule {
            days: DaySet::every_day(),
            light_groups: vec!["Living Room".to_string()],
            trigger: TimeTrigger::FixedLocalTime(format!("{hour}:{minute}").parse().unwrap()),
            target_state: LightState::new(index as u8).unwrap(),
            conditions: Vec::new(),
        })
        .collect()
}

proptest! {
    /// Every action lies strictly after now and at most a day (plus a DST hour) ahead
    #[test]
    fn prop_fixed_actions_strictly_future_and_within_a_day(
        tz_index in 0usize..TIMEZONES.len(),
        times in prop::collection::vec(fixed_rule_strategy(), 1..8),
        now in instant_strategy(),
    ) {
        Log::set_enabled(false);
        let tz: Tz = TIMEZONES[tz_index].parse().unwrap();
        let location = LocationConfig::new(tz, 0.0, 0.0).unwrap();
        let scheduler = Scheduler::new(location, build_rules(&times));

        let actions = scheduler.next_scheduled_actions(now).unwrap();

        prop_assert_eq!(actions.len(), times.len());
        for action in &actions {
            let fires_at = action.scheduled_for.with_timezone(&Utc);
            prop_assert!(fires_at > now);
            prop_assert!(fires_at - now <= Duration::hours(25));
        }
    }

    /// The queue is sorted and rules with the same instant keep their input order
    #[test]
    fn prop_queue_sorted_and_stable(
        times in prop::collection::vec((0u32..3, prop_oneof![Just(0u32), Just(30u32)]), 1..12),
        now in instant_strategy(),
    ) {
        Log::set_enabled(false);
        let location = LocationConfig::new(chrono_tz::America::New_York, 40.71, -74.0).unwrap();
        let scheduler = Scheduler::new(location, build_rules(&times));

        let actions = scheduler.next_scheduled_actions(now).unwrap();

        for pair in actions.windows(2) {
            prop_assert!(pair[0].scheduled_for <= pair[1].scheduled_for);
            if pair[0].scheduled_for == pair[1].scheduled_for {
                prop_assert!(
                    pair[0].rule.target_state.brightness_percent()
                        < pair[1].rule.target_state.brightness_percent()
                );
            }
        }
    }

    /// Outside a DST gap, the action lands on the configured wall-clock time
    #[test]
    fn prop_fixed_actions_keep_wall_clock_time(
        (hour, minute) in fixed_rule_strategy(),
        now in instant_strategy(),
    ) {
        Log::set_enabled(false);
        let tz = chrono_tz::Europe::Berlin;
        let location = LocationConfig::new(tz, 52.52, 13.40).unwrap();
        let scheduler = Scheduler::new(location, build_rules(&[(hour, minute)]));

        let actions = scheduler.next_scheduled_actions(now).unwrap();
        let fires_at = actions[0].scheduled_for;

        // Berlin skips 02:00-02:59 on the spring-forward date
        prop_assume!(hour != 2);
        prop_assert_eq!((fires_at.hour(), fires_at.minute()), (hour, minute));
    }
}
