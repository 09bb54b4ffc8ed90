use std::process::ExitCode;

use label_engine::{ActorId, ConditionDuration, Pose, Vec3};
use tracing::{error, info};

use super::bootstrap::AppWiring;
use super::host_session::HostSession;
use super::roster::RosterError;

const ALICE: ActorId = ActorId(1);
const BOB: ActorId = ActorId(2);
const CARA: ActorId = ActorId(3);

/// One scripted world event, applied before the service tick of the same number.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum DemoEvent {
    Join {
        id: ActorId,
        name: &'static str,
        pose: Pose,
    },
    Move {
        id: ActorId,
        to: Vec3,
    },
    Face {
        id: ActorId,
        facing: Vec3,
    },
    Condition {
        id: ActorId,
        kind: &'static str,
        intensity: u32,
        remaining: ConditionDuration,
    },
    ClearConditions(ActorId),
    Command {
        sender: ActorId,
        line: &'static str,
    },
    Complete {
        sender: ActorId,
        line: &'static str,
    },
    Leave(ActorId),
    Disconnect(ActorId),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct DemoSummary {
    pub(crate) ticks: u64,
    pub(crate) batch_passes: u64,
    pub(crate) rebuilt: usize,
    pub(crate) repositioned: usize,
    pub(crate) move_updates: usize,
    pub(crate) aborted: usize,
    pub(crate) pruned: Vec<ActorId>,
    pub(crate) peak_labels: usize,
    pub(crate) released_at_shutdown: usize,
}

pub(crate) fn run(app: AppWiring) -> ExitCode {
    let AppWiring {
        mut session,
        demo_ticks,
    } = app;
    match run_demo(&mut session, demo_ticks) {
        Ok(summary) => {
            info!(
                ticks = summary.ticks,
                batch_passes = summary.batch_passes,
                rebuilt = summary.rebuilt,
                repositioned = summary.repositioned,
                move_updates = summary.move_updates,
                aborted = summary.aborted,
                pruned = summary.pruned.len(),
                peak_labels = summary.peak_labels,
                released = summary.released_at_shutdown,
                service_ticks = session.service().tick_count(),
                "label_demo_finished"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "label_demo_failed");
            session.shutdown();
            ExitCode::FAILURE
        }
    }
}

/// Plays the scripted session for `ticks` ticks and shuts the service down.
pub(crate) fn run_demo(session: &mut HostSession, ticks: u64) -> Result<DemoSummary, RosterError> {
    let script = demo_script();
    let mut cursor = 0;
    let mut summary = DemoSummary::default();

    for tick in 0..ticks {
        while let Some((at, event)) = script.get(cursor) {
            if *at != tick {
                break;
            }
            apply_event(session, event, &mut summary)?;
            cursor += 1;
        }

        if let Some(report) = session.tick() {
            summary.batch_passes += 1;
            summary.rebuilt += report.rebuilt;
            summary.repositioned += report.repositioned;
            summary.aborted += report.aborted;
            summary.pruned.extend(report.pruned);
        }
        summary.peak_labels = summary
            .peak_labels
            .max(session.host().world.labels.live_count());
        summary.ticks += 1;
    }

    summary.released_at_shutdown = session.shutdown();
    Ok(summary)
}

fn apply_event(
    session: &mut HostSession,
    event: &DemoEvent,
    summary: &mut DemoSummary,
) -> Result<(), RosterError> {
    match event {
        DemoEvent::Join { id, name, pose } => {
            session.join(*id, name, *pose);
            info!(actor = id.0, name = %name, "actor_joined");
        }
        DemoEvent::Move { id, to } => {
            if session.move_actor(*id, *to).is_some() {
                summary.move_updates += 1;
            }
        }
        DemoEvent::Face { id, facing } => {
            session.face(*id, *facing);
        }
        DemoEvent::Condition {
            id,
            kind,
            intensity,
            remaining,
        } => {
            session.apply_condition(*id, kind, *intensity, *remaining);
        }
        DemoEvent::ClearConditions(id) => {
            session.clear_conditions(*id);
        }
        DemoEvent::Command { sender, line } => {
            let reply = session.run_command(*sender, line)?;
            for reply_line in &reply.lines {
                info!(sender = sender.0, command = %line, reply = %reply_line, "command_reply");
            }
        }
        DemoEvent::Complete { sender, line } => {
            let suggestions = session.complete(*sender, line);
            info!(
                sender = sender.0,
                partial = %line,
                suggestions = %suggestions.join(","),
                "command_completion"
            );
        }
        DemoEvent::Leave(id) => {
            if session.leave(*id) {
                info!(actor = id.0, "actor_left");
            }
        }
        DemoEvent::Disconnect(id) => {
            session.disconnect(*id);
        }
    }
    Ok(())
}

/// The fixed demo schedule, sorted by tick.
pub(crate) fn demo_script() -> Vec<(u64, DemoEvent)> {
    let north = Vec3::new(0.0, 0.0, 1.0);
    let mut script = vec![
        (
            0,
            DemoEvent::Join {
                id: ALICE,
                name: "Alice",
                pose: Pose::new(Vec3::new(0.0, 64.0, 0.0), north),
            },
        ),
        (
            0,
            DemoEvent::Join {
                id: BOB,
                name: "Bob",
                pose: Pose::new(Vec3::new(3.0, 64.0, 0.0), Vec3::new(1.0, 0.0, 0.0)),
            },
        ),
        (
            0,
            DemoEvent::Join {
                id: CARA,
                name: "Cara",
                pose: Pose::new(Vec3::new(-3.0, 64.0, 2.0), Vec3::new(0.0, 1.0, 0.0)),
            },
        ),
        (
            1,
            DemoEvent::Command {
                sender: ALICE,
                line: "/open effect on",
            },
        ),
        (
            2,
            DemoEvent::Command {
                sender: ALICE,
                line: "/openeffect add member Bob",
            },
        ),
        (
            3,
            DemoEvent::Command {
                sender: BOB,
                line: "/open effect on",
            },
        ),
        (
            5,
            DemoEvent::Condition {
                id: BOB,
                kind: "POISON",
                intensity: 2,
                remaining: ConditionDuration::Ticks(130),
            },
        ),
        (
            5,
            DemoEvent::Condition {
                id: BOB,
                kind: "SPEED",
                intensity: 1,
                remaining: ConditionDuration::Unbounded,
            },
        ),
        (
            8,
            DemoEvent::Complete {
                sender: ALICE,
                line: "/openeffect ",
            },
        ),
        (
            20,
            DemoEvent::Condition {
                id: CARA,
                kind: "REGENERATION",
                intensity: 3,
                remaining: ConditionDuration::Ticks(60),
            },
        ),
        (
            30,
            DemoEvent::Command {
                sender: ALICE,
                line: "/openeffect all",
            },
        ),
        (
            60,
            DemoEvent::Face {
                id: BOB,
                facing: Vec3::new(0.0, 0.0, -1.0),
            },
        ),
        (
            90,
            DemoEvent::Command {
                sender: BOB,
                line: "/openeffect add owner Cara",
            },
        ),
        (95, DemoEvent::ClearConditions(BOB)),
        (
            100,
            DemoEvent::Command {
                sender: ALICE,
                line: "/openeffect remove member Bob",
            },
        ),
        (120, DemoEvent::Leave(CARA)),
        (150, DemoEvent::Disconnect(BOB)),
    ];

    for step in 0..16u32 {
        script.push((
            10 + u64::from(step) * 4,
            DemoEvent::Move {
                id: BOB,
                to: Vec3::new(3.0 + f64::from(step + 1) * 0.25, 64.0, 0.0),
            },
        ));
    }
    script.sort_by_key(|(tick, _)| *tick);
    script
}
