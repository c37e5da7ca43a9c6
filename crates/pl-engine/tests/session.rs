//! End-to-end session tests against the bundled dataset.

use std::path::{Path, PathBuf};

use pl_dataset::{Equipment, load_dataset};
use pl_engine::session::MOTOR_PANEL_LOCKED;
use pl_engine::{
    Action, HostCall, ImageDescriptor, Outcome, Overlay, OverlayKind, RecordingHost, Session,
    SoundChannel, StatusKind,
};
use pl_report::{ExportFormat, PdfRenderer};
use pl_settings::Settings;

fn fixture_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../data/system1")
}

fn returning_user() -> RecordingHost {
    RecordingHost::with_settings(Settings {
        tutorial_completed: true,
        ..Settings::default()
    })
}

fn session() -> Session<RecordingHost> {
    let dataset = load_dataset(&fixture_dir()).unwrap();
    Session::new(dataset, returning_user(), 3).unwrap()
}

fn first_run_session() -> Session<RecordingHost> {
    let dataset = load_dataset(&fixture_dir()).unwrap();
    Session::new(dataset, RecordingHost::new(), 3).unwrap()
}

fn value(session: &Session<RecordingHost>, key: &str) -> String {
    session.registry().get(key).unwrap().value().to_string()
}

#[test]
fn starts_on_the_first_recorded_state() {
    let s = session();
    assert_eq!(value(&s, "rpm"), "0 (0)");
    assert_eq!(value(&s, "abertura"), "0");
    assert_eq!(value(&s, "q(l/m)"), "0");
    assert!(s.log().is_empty());
    assert!(!s.is_motor_on());

    let host = s.host();
    assert!(
        host.calls
            .contains(&HostCall::DisplayValue("p2".into(), "0".to_string()))
    );
    assert_eq!(host.playing(SoundChannel::Pump), Some(false));
    assert_eq!(
        host.last_image(),
        Some(&ImageDescriptor::Overview {
            index: 0,
            water_flowing: false
        })
    );
}

#[test]
fn first_run_starts_the_tour() {
    let s = first_run_session();

    assert!(s.tutorial().is_active());
    assert_eq!(s.tutorial().step(), Some(0));
    assert_eq!(s.gate().allowed_ids(), vec![Action::NextImage.id()]);
    assert_eq!(s.host().buttons_visible(), Some(false));
    assert_eq!(s.host().store.persist_count, 0);
    assert!(!s.host().store.settings.tutorial_completed);
}

#[test]
fn completed_tour_is_not_restarted() {
    let s = session();
    assert!(!s.tutorial().is_active());
    assert!(s.gate().all_allowed());
    assert_eq!(s.host().buttons_visible(), Some(true));
}

#[test]
fn without_tour_ignores_the_flag() {
    let dataset = load_dataset(&fixture_dir()).unwrap();
    let s = Session::without_tour(dataset, RecordingHost::new(), 3).unwrap();
    assert!(!s.tutorial().is_active());
    assert!(s.gate().all_allowed());
}

#[test]
fn motor_on_then_valve_follows_the_table() {
    let mut s = session();
    assert_eq!(s.motor_on().unwrap(), Outcome::Applied);
    assert_eq!(value(&s, "rpm"), "890 (50)");
    assert_eq!(value(&s, "p2"), "5.35");
    assert!(s.is_panel_open("rpm"));
    assert_eq!(s.host().playing(SoundChannel::Pump), Some(true));
    assert_eq!(s.host().playing(SoundChannel::Water), Some(false));

    assert_eq!(s.set_value("abertura", "50").unwrap(), Outcome::Applied);
    assert_eq!(value(&s, "q(l/m)"), "226.3");
    assert_eq!(value(&s, "p1"), "-2.35");
    assert!(s.is_water_flowing());
    assert_eq!(s.host().playing(SoundChannel::Water), Some(true));
    assert_eq!(
        s.host().last_image(),
        Some(&ImageDescriptor::Overview {
            index: 0,
            water_flowing: true
        })
    );

    assert_eq!(s.log().len(), 2);
    let entry = &s.log().entries()[1];
    assert_eq!(entry.changed().key.as_str(), "abertura");
    assert_eq!(entry.before().get("q(l/m)"), Some("0"));
    assert_eq!(entry.after().get("q(l/m)"), Some("226.3"));
}

#[test]
fn repeated_value_is_logged_once() {
    let mut s = session();
    s.motor_on().unwrap();
    let logged = s.log().len();

    assert_eq!(s.set_value("abertura", "75").unwrap(), Outcome::Applied);
    let derived = value(&s, "q(l/m)");
    assert_eq!(s.set_value("abertura", "75").unwrap(), Outcome::Unchanged);

    assert_eq!(s.log().len(), logged + 1);
    assert_eq!(value(&s, "q(l/m)"), derived);
}

#[test]
fn logged_entries_survive_later_changes() {
    let mut s = session();
    s.motor_on().unwrap();
    s.set_value("abertura", "25").unwrap();
    let first = s.log().entries()[1].clone();

    s.set_value("abertura", "100").unwrap();
    s.set_value("rpm", "1750").unwrap();

    assert_eq!(s.log().entries()[1], first);
    assert_eq!(first.after().get("q(l/m)"), Some("160"));
}

#[test]
fn motor_speed_can_be_picked_in_the_panel() {
    let mut s = session();
    s.motor_on().unwrap();
    s.set_value("abertura", "100").unwrap();
    assert_eq!(s.set_value("rpm", "1245 (70)").unwrap(), Outcome::Applied);
    assert_eq!(value(&s, "q(l/m)"), "448");
    assert_eq!(value(&s, "piezometro"), "2.06");
}

#[test]
fn motor_panel_needs_the_motor_on() {
    let mut s = session();
    assert_eq!(
        s.press_panel_button(Equipment::ElectricMotor).unwrap(),
        Outcome::Applied
    );
    assert!(!s.is_panel_open("rpm"));
    let status = s.host().last_status().unwrap();
    assert_eq!(status.kind, StatusKind::Error);
    assert_eq!(status.text, MOTOR_PANEL_LOCKED);

    s.press_panel_button(Equipment::BallValve).unwrap();
    assert!(s.is_panel_open("abertura"));
    s.press_panel_button(Equipment::BallValve).unwrap();
    assert!(!s.is_panel_open("abertura"));
}

#[test]
fn motor_off_returns_to_baseline() {
    let mut s = session();
    s.motor_on().unwrap();
    s.set_value("abertura", "50").unwrap();

    assert_eq!(s.motor_off().unwrap(), Outcome::Applied);
    assert_eq!(value(&s, "rpm"), "0 (0)");
    assert_eq!(value(&s, "q(l/m)"), "0");
    assert!(!s.is_panel_open("rpm"));
    assert!(!s.is_water_flowing());
    assert_eq!(s.host().playing(SoundChannel::Pump), Some(false));
    assert_eq!(s.motor_off().unwrap(), Outcome::Unchanged);
}

#[test]
fn derived_controls_cannot_be_set() {
    let mut s = session();
    assert!(s.set_value("q(l/m)", "10").is_err());
    assert!(s.set_value("abertura", "33").is_err());
    assert!(s.set_value("missing", "1").is_err());
}

#[test]
fn images_wrap_and_zoom_is_left_first() {
    let mut s = session();
    s.previous_image().unwrap();
    assert_eq!(s.image_index(), 2);
    s.next_image().unwrap();
    assert_eq!(s.image_index(), 0);

    s.next_image().unwrap();
    s.zoom(Equipment::FlowMeter).unwrap();
    assert_eq!(s.zoomed(), Some(Equipment::FlowMeter));
    assert!(s.host().calls.contains(&HostCall::DrawOverlay(Overlay {
        kind: OverlayKind::EquipmentTable(Equipment::FlowMeter),
        position: (130, 60),
    })));
    assert_eq!(s.host().buttons_visible(), Some(false));

    s.next_image().unwrap();
    assert_eq!(s.zoomed(), None);
    assert_eq!(s.image_index(), 1);
    assert_eq!(s.host().buttons_visible(), Some(true));
}

#[test]
fn init_tutorial_resets_everything() {
    let mut s = session();
    s.motor_on().unwrap();
    s.set_value("abertura", "50").unwrap();
    s.next_image().unwrap();

    s.init_tutorial().unwrap();
    assert_eq!(s.tutorial().step(), Some(0));
    assert_eq!(value(&s, "rpm"), "0 (0)");
    assert_eq!(value(&s, "abertura"), "0");
    assert!(s.log().is_empty());
    assert!(!s.is_panel_open("rpm"));
    assert_eq!(s.image_index(), 0);
    assert_eq!(s.gate().allowed_ids(), vec![1]);
    assert_eq!(s.host().buttons_visible(), Some(false));
    assert!(s.host().calls.contains(&HostCall::DrawOverlay(Overlay {
        kind: OverlayKind::TutorialStep(0),
        position: (120, 80),
    })));
}

#[test]
fn left_on_first_step_stays_put() {
    let mut s = session();
    s.init_tutorial().unwrap();
    assert_eq!(s.previous_image().unwrap(), Outcome::Denied);
    assert_eq!(s.tutorial().step(), Some(0));
}

#[test]
fn zoom_steps_show_their_equipment() {
    let mut s = session();
    s.init_tutorial().unwrap();
    for _ in 0..4 {
        s.next_image().unwrap();
    }
    assert_eq!(s.tutorial().step(), Some(4));
    assert_eq!(s.zoomed(), Some(Equipment::Piezometer));

    for _ in 0..5 {
        s.next_image().unwrap();
    }
    assert_eq!(s.tutorial().step(), Some(9));
    assert_eq!(s.zoomed(), Some(Equipment::Pump));
}

#[test]
fn full_tutorial_walk() {
    let mut s = first_run_session();
    assert_eq!(s.tutorial().step(), Some(0));
    for _ in 0..14 {
        assert_eq!(s.next_image().unwrap(), Outcome::Applied);
    }
    assert_eq!(s.tutorial().step(), Some(14));
    assert_eq!(s.zoomed(), None);

    // only the motor switch is live here
    assert_eq!(s.next_image().unwrap(), Outcome::Denied);
    assert_eq!(s.set_value("abertura", "25").unwrap(), Outcome::Denied);
    assert_eq!(s.motor_on().unwrap(), Outcome::Applied);
    assert_eq!(s.tutorial().step(), Some(15));
    assert!(!s.registry().get("rpm").unwrap().is_enabled());
    assert_eq!(s.set_value("rpm", "1750").unwrap(), Outcome::Denied);

    assert_eq!(s.set_value("abertura", "25").unwrap(), Outcome::Applied);
    assert_eq!(s.tutorial().step(), Some(16));

    for equipment in [
        Equipment::FlowMeter,
        Equipment::VacuumGauge,
        Equipment::PressureGauge,
    ] {
        assert!(s.gate().is_allowed(Action::Panel(equipment)));
        s.press_panel_button(equipment).unwrap();
    }
    assert_eq!(s.tutorial().step(), Some(19));

    s.next_image().unwrap();
    assert_eq!(s.tutorial().step(), Some(20));
    s.next_image().unwrap();

    assert!(!s.tutorial().is_active());
    assert!(s.gate().all_allowed());
    assert!(s.registry().get("rpm").unwrap().is_enabled());
    assert!(s.host().store.settings.tutorial_completed);
    assert_eq!(s.host().store.persist_count, 1);
    assert_eq!(s.host().buttons_visible(), Some(true));
    assert_eq!(s.host().calls.last().map(|c| matches!(c, HostCall::Status(_))), Some(true));
}

#[test]
fn ending_twice_persists_once() {
    let mut s = session();
    s.init_tutorial().unwrap();
    for _ in 0..13 {
        s.next_image().unwrap();
    }
    s.end_tutorial().unwrap();
    assert_eq!(s.host().store.persist_count, 1);
    s.end_tutorial().unwrap();
    assert_eq!(s.host().store.persist_count, 1);
    assert!(s.gate().all_allowed());
}

#[test]
fn restarting_ends_the_running_tutorial() {
    let mut s = session();
    s.init_tutorial().unwrap();
    s.next_image().unwrap();
    s.init_tutorial().unwrap();
    assert_eq!(s.tutorial().step(), Some(0));
    assert_eq!(s.host().store.persist_count, 1);
}

#[test]
fn sound_and_volume_follow_settings() {
    let mut s = session();
    s.motor_on().unwrap();
    s.set_value("abertura", "25").unwrap();
    assert_eq!(s.host().playing(SoundChannel::Water), Some(true));

    s.set_sound_active(false).unwrap();
    assert_eq!(s.host().playing(SoundChannel::Pump), Some(false));
    assert_eq!(s.host().playing(SoundChannel::Water), Some(false));

    s.host_mut().take_calls();
    s.set_volume(50).unwrap();
    assert_eq!(
        s.host().calls,
        vec![
            HostCall::Volume(SoundChannel::Pump, 0.1),
            HostCall::Volume(SoundChannel::Water, 0.5),
        ]
    );
    assert_eq!(s.host().store.persist_count, 2);
}

#[test]
fn tooltips_show_value_and_unit() {
    let mut s = session();
    s.motor_on().unwrap();
    assert!(s.host().calls.contains(&HostCall::Tooltip(
        "rpm".into(),
        "890 (50) RPM (%)".to_string()
    )));

    s.host_mut().take_calls();
    s.set_tooltip_content(false).unwrap();
    assert!(
        s.host()
            .calls
            .iter()
            .all(|c| matches!(c, HostCall::Tooltip(_, text) if text.is_empty()))
    );
}

#[test]
fn report_exports_and_saves() {
    let mut s = session();
    let pdf = PdfRenderer::default();
    assert!(s.export_report(ExportFormat::Csv, &pdf).is_err());

    s.motor_on().unwrap();
    let csv = String::from_utf8(s.export_report(ExportFormat::Csv, &pdf).unwrap()).unwrap();
    assert!(csv.starts_with("State,Valve (%),Flow meter (Q (l/min)),Electric motor (RPM (%))"));
    assert!(csv.contains("Change,,,890 (50),,,"));

    let dir = std::env::temp_dir().join("pl_engine_report");
    std::fs::create_dir_all(&dir).unwrap();
    let written = s
        .save_report(&dir.join("report"), ExportFormat::Csv, &pdf)
        .unwrap();
    assert_eq!(written, dir.join("report.csv"));
    assert!(std::fs::read_to_string(&written).unwrap().contains("Obtained at:"));
    assert_eq!(s.host().last_status().unwrap().kind, StatusKind::Success);

    s.clear_report();
    assert!(s.log().is_empty());
}
