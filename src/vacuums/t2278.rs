//! eufy Clean L60 Hybrid SES (T2278).
//!
//! MODE, START_PAUSE and RETURN_HOME all share DPS 152; pause and return are
//! issued as mode writes.

use super::{
    CommandSpec, RoboVacEntityFeature, RobovacCommand, RobovacModelDetails, VacuumActivity,
    VacuumEntityFeature,
};

const MODE_VALUES: &[(&str, &str)] = &[
    ("standby", "AA=="),
    ("pause", "AggN"),
    ("stop", "AggG"),
    ("return", "AggG"),
    ("auto", "BBoCCAE="),
    ("nosweep", "AggO"),
    ("AA==", "standby"),
    ("AggN", "pause"),
    ("AggG", "stop"),
    ("BBoCCAE=", "auto"),
    ("AggO", "nosweep"),
];

const STATUS_VALUES: &[(&str, &str)] = &[
    ("AA==", "Standby"),
    ("AggB", "Paused"),
    ("AhAB", "Sleeping"),
    ("BBADGgA=", "Charging"),
    ("BBAHQgA=", "Heading Home"),
    ("BgoAEAUyAA==", "Cleaning"),
    ("BgoAEAVSAA==", "Positioning"),
    ("BgoAEAdCAA==", "Heading Home Mid Clean"),
    ("BhADGgIIAQ==", "Completed"),
    ("CAoAEAUyAggB", "Paused"),
    ("CAoCCAEQBTIA", "Room Cleaning"),
    ("CAoCCAEQBVIA", "Room Positioning"),
    ("CAoCCAIQBTIA", "Zone Cleaning"),
    ("CAoCCAIQBVIA", "Zone Positioning"),
    ("CgoCCAEQBTICCAE=", "Room Paused"),
    ("CgoCCAIQBTICCAE=", "Zone Paused"),
];

const FAN_SPEED_VALUES: &[(&str, &str)] = &[
    ("quiet", "Quiet"),
    ("standard", "Standard"),
    ("turbo", "Turbo"),
    ("max", "Max"),
];

pub static T2278: RobovacModelDetails = RobovacModelDetails {
    model: "T2278",
    name: "eufy Clean L60 Hybrid SES",
    homeassistant_features: VacuumEntityFeature::CLEAN_SPOT
        .union(VacuumEntityFeature::FAN_SPEED)
        .union(VacuumEntityFeature::LOCATE)
        .union(VacuumEntityFeature::PAUSE)
        .union(VacuumEntityFeature::RETURN_HOME)
        .union(VacuumEntityFeature::SEND_COMMAND)
        .union(VacuumEntityFeature::START)
        .union(VacuumEntityFeature::STATE)
        .union(VacuumEntityFeature::STOP),
    robovac_features: RoboVacEntityFeature::CLEANING_TIME
        .union(RoboVacEntityFeature::CLEANING_AREA)
        .union(RoboVacEntityFeature::DO_NOT_DISTURB)
        .union(RoboVacEntityFeature::AUTO_RETURN)
        .union(RoboVacEntityFeature::ROOM)
        .union(RoboVacEntityFeature::ZONE)
        .union(RoboVacEntityFeature::BOOST_IQ)
        .union(RoboVacEntityFeature::MAP),
    commands: &[
        (
            RobovacCommand::Mode,
            CommandSpec {
                code: 152,
                values: Some(MODE_VALUES),
            },
        ),
        (
            RobovacCommand::StartPause,
            CommandSpec {
                code: 152,
                values: Some(&[("pause", "AggN")]),
            },
        ),
        (
            RobovacCommand::ReturnHome,
            CommandSpec {
                code: 152,
                values: Some(&[("return", "AggG")]),
            },
        ),
        (
            RobovacCommand::Status,
            CommandSpec {
                code: 153,
                values: Some(STATUS_VALUES),
            },
        ),
        (
            RobovacCommand::FanSpeed,
            CommandSpec {
                code: 158,
                values: Some(FAN_SPEED_VALUES),
            },
        ),
        (
            RobovacCommand::Locate,
            CommandSpec {
                code: 160,
                values: Some(&[("locate", "true")]),
            },
        ),
        (
            RobovacCommand::Battery,
            CommandSpec {
                code: 163,
                values: None,
            },
        ),
    ],
    activity_mapping: &[
        ("Cleaning", VacuumActivity::Cleaning),
        ("Charging", VacuumActivity::Docked),
        ("Completed", VacuumActivity::Docked),
        ("Heading Home", VacuumActivity::Returning),
        ("Heading Home Mid Clean", VacuumActivity::Returning),
        ("Paused", VacuumActivity::Paused),
        ("Positioning", VacuumActivity::Cleaning),
        ("Room Cleaning", VacuumActivity::Cleaning),
        ("Room Paused", VacuumActivity::Paused),
        ("Room Positioning", VacuumActivity::Cleaning),
        ("Sleeping", VacuumActivity::Idle),
        ("Standby", VacuumActivity::Idle),
        ("Zone Cleaning", VacuumActivity::Cleaning),
        ("Zone Paused", VacuumActivity::Paused),
        ("Zone Positioning", VacuumActivity::Cleaning),
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    fn code(kind: RobovacCommand) -> Option<u16> {
        T2278.command(kind).map(|c| c.code)
    }

    #[test]
    fn command_codes() {
        assert_eq!(code(RobovacCommand::Mode), Some(152));
        assert_eq!(code(RobovacCommand::StartPause), Some(152));
        assert_eq!(code(RobovacCommand::Status), Some(153));
        assert_eq!(code(RobovacCommand::ReturnHome), Some(152));
        assert_eq!(code(RobovacCommand::FanSpeed), Some(158));
        assert_eq!(code(RobovacCommand::Locate), Some(160));
        assert_eq!(code(RobovacCommand::Battery), Some(163));
        assert_eq!(code(RobovacCommand::Error), None);
    }

    #[test]
    fn each_kind_declared_once() {
        for (i, (kind, _)) in T2278.commands.iter().enumerate() {
            assert!(
                !T2278.commands[i + 1..].iter().any(|(k, _)| k == kind),
                "{kind} declared twice"
            );
        }
    }

    #[test]
    fn mode_reverse_entries() {
        let mode = T2278.command(RobovacCommand::Mode).unwrap();
        let reverse = [
            ("AA==", "standby"),
            ("AggN", "pause"),
            ("AggG", "stop"),
            ("BBoCCAE=", "auto"),
            ("AggO", "nosweep"),
        ];
        for (token, label) in reverse {
            assert_eq!(mode.lookup(token), Some(label), "{token}");
            assert_eq!(mode.lookup(label), Some(token), "{label}");
        }
        // return shares stop's token and decodes as stop
        assert_eq!(mode.lookup("return"), Some("AggG"));
    }

    #[test]
    fn every_status_has_an_activity() {
        for (token, status) in STATUS_VALUES {
            assert!(
                T2278.activity(status).is_some(),
                "{token} decodes to {status}, which has no activity"
            );
        }
    }

    #[test]
    fn activity_mapping_has_no_orphans() {
        for (status, _) in T2278.activity_mapping {
            assert!(
                STATUS_VALUES.iter().any(|(_, s)| s == status),
                "{status} is never reported by the device"
            );
        }
    }

    #[test]
    fn activity_mapping_groups() {
        let expect = |statuses: &[&str], activity| {
            for s in statuses {
                assert_eq!(T2278.activity(s), Some(activity), "{s}");
            }
        };
        expect(
            &[
                "Cleaning",
                "Positioning",
                "Room Cleaning",
                "Room Positioning",
                "Zone Cleaning",
                "Zone Positioning",
            ],
            VacuumActivity::Cleaning,
        );
        expect(&["Charging", "Completed"], VacuumActivity::Docked);
        expect(&["Paused", "Room Paused", "Zone Paused"], VacuumActivity::Paused);
        expect(
            &["Heading Home", "Heading Home Mid Clean"],
            VacuumActivity::Returning,
        );
        expect(&["Sleeping", "Standby"], VacuumActivity::Idle);
    }

    #[test]
    fn features() {
        let ha = T2278.homeassistant_features;
        assert!(ha.contains(VacuumEntityFeature::FAN_SPEED | VacuumEntityFeature::LOCATE));
        assert!(ha.contains(VacuumEntityFeature::START | VacuumEntityFeature::STOP));
        assert!(!ha.contains(VacuumEntityFeature::BATTERY));
        assert!(!ha.contains(VacuumEntityFeature::MAP));

        let rv = T2278.robovac_features;
        assert!(rv.contains(RoboVacEntityFeature::BOOST_IQ | RoboVacEntityFeature::ZONE));
        assert!(!rv.contains(RoboVacEntityFeature::EDGE));
        assert!(!rv.contains(RoboVacEntityFeature::CONSUMABLES));
    }
}
