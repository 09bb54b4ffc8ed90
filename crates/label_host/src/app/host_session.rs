use label_engine::{
    ActiveCondition, ActorId, BackendError, ConditionDuration, ConfigError, LabelBackend,
    LabelConfig, LabelHandle, LabelService, Pose, SyncReport, TargetSnapshot, TargetSource,
    UpdateOutcome, Vec3, ViewerState,
};
use tracing::debug;

use super::commands::{self, CommandEffect, CommandReply, PlayerDirectory};
use super::roster::{AccessRoster, RosterError};
use super::sim_world::SimWorld;

/// Host-side state the label service reads and drives: the simulated world and the access
/// roster that decides who may see labels.
#[derive(Debug)]
pub(crate) struct SessionHost {
    pub(crate) world: SimWorld,
    pub(crate) roster: AccessRoster,
}

impl LabelBackend for SessionHost {
    fn spawn_label(&mut self, position: Vec3, text: &str) -> Result<LabelHandle, BackendError> {
        self.world.labels.spawn(position, text)
    }

    fn destroy_label(&mut self, handle: LabelHandle) -> Result<(), BackendError> {
        self.world.labels.destroy(handle)
    }

    fn set_text(&mut self, handle: LabelHandle, text: &str) -> Result<(), BackendError> {
        let object = self.world.labels.get_mut(handle)?;
        object.text.clear();
        object.text.push_str(text);
        Ok(())
    }

    fn teleport(&mut self, handle: LabelHandle, position: Vec3) -> Result<(), BackendError> {
        self.world.labels.get_mut(handle)?.position = position;
        Ok(())
    }

    fn set_visible(
        &mut self,
        viewer: ActorId,
        handle: LabelHandle,
        visible: bool,
    ) -> Result<(), BackendError> {
        let object = self.world.labels.get_mut(handle)?;
        if visible {
            object.visible_to.insert(viewer);
        } else {
            object.visible_to.remove(&viewer);
        }
        Ok(())
    }
}

impl TargetSource for SessionHost {
    fn live_targets(&self) -> Vec<TargetSnapshot> {
        self.world.actors().map(|actor| actor.snapshot()).collect()
    }

    fn is_live(&self, id: ActorId) -> bool {
        self.world.is_online(id)
    }

    fn active_conditions(&self, id: ActorId) -> Vec<ActiveCondition> {
        self.world
            .actor(id)
            .map(|actor| actor.conditions().to_vec())
            .unwrap_or_default()
    }

    fn viewers(&self) -> Vec<ViewerState> {
        self.world
            .actors()
            .map(|actor| ViewerState {
                id: actor.id,
                wants_labels: self.roster.is_enabled(actor.id),
            })
            .collect()
    }

    fn is_authorized(&self, viewer: ActorId) -> bool {
        self.roster.is_authorized(viewer)
    }
}

impl PlayerDirectory for SimWorld {
    fn resolve_name(&self, name: &str) -> Option<ActorId> {
        SimWorld::resolve_name(self, name)
    }

    fn display_name(&self, id: ActorId) -> Option<String> {
        SimWorld::display_name(self, id).map(str::to_string)
    }
}

/// Routes world events into the label service.
#[derive(Debug)]
pub(crate) struct HostSession {
    host: SessionHost,
    service: LabelService,
}

impl HostSession {
    pub(crate) fn new(config: LabelConfig, roster: AccessRoster) -> Result<Self, ConfigError> {
        Ok(Self {
            host: SessionHost {
                world: SimWorld::default(),
                roster,
            },
            service: LabelService::new(config)?,
        })
    }

    pub(crate) fn host(&self) -> &SessionHost {
        &self.host
    }

    pub(crate) fn service(&self) -> &LabelService {
        &self.service
    }

    pub(crate) fn start(&mut self) {
        self.service.startup(&mut self.host);
    }

    pub(crate) fn join(&mut self, id: ActorId, name: &str, pose: Pose) {
        let snapshot = self.host.world.join(id, name, pose);
        self.service.on_target_join(&snapshot, &mut self.host);
    }

    pub(crate) fn leave(&mut self, id: ActorId) -> bool {
        if !self.host.world.leave(id) {
            return false;
        }
        self.host.world.labels.forget_viewer(id);
        self.service.on_target_leave(id, &mut self.host)
    }

    /// Drops an actor without a leave event; the next sweep has to clean up after it.
    pub(crate) fn disconnect(&mut self, id: ActorId) -> bool {
        let removed = self.host.world.leave(id);
        if removed {
            self.host.world.labels.forget_viewer(id);
            debug!(actor = id.0, "actor_disconnected_without_leave");
        }
        removed
    }

    pub(crate) fn move_actor(&mut self, id: ActorId, eye_position: Vec3) -> Option<UpdateOutcome> {
        let (from, to) = self.host.world.move_to(id, eye_position)?;
        let snapshot = self.host.world.actor(id)?.snapshot();
        self.service
            .on_target_moved(&snapshot, from, to, &mut self.host)
    }

    pub(crate) fn face(&mut self, id: ActorId, facing: Vec3) -> bool {
        self.host.world.face(id, facing)
    }

    pub(crate) fn apply_condition(
        &mut self,
        id: ActorId,
        kind: &str,
        intensity: u32,
        remaining: ConditionDuration,
    ) -> bool {
        self.host
            .world
            .apply_condition(id, kind, intensity, remaining)
    }

    pub(crate) fn clear_conditions(&mut self, id: ActorId) -> bool {
        self.host.world.clear_conditions(id)
    }

    /// Advances world time by one tick, then lets the service sync on its cadence.
    pub(crate) fn tick(&mut self) -> Option<SyncReport> {
        let expired = self.host.world.advance_conditions();
        if expired > 0 {
            debug!(expired, "conditions_expired");
        }
        self.service.on_tick(&mut self.host)
    }

    pub(crate) fn run_command(
        &mut self,
        sender: ActorId,
        line: &str,
    ) -> Result<CommandReply, RosterError> {
        let reply = commands::execute_line(
            sender,
            line,
            &mut self.host.roster,
            &self.host.world,
        )?;
        match reply.effect {
            CommandEffect::None => {}
            CommandEffect::PreferenceChanged { viewer, wants_show } => {
                self.service
                    .on_viewer_preference_changed(viewer, wants_show, &mut self.host);
            }
            CommandEffect::RefreshViewer(viewer) if self.host.world.is_online(viewer) => {
                let wants_show = self.host.roster.can_use(viewer);
                self.service
                    .on_viewer_preference_changed(viewer, wants_show, &mut self.host);
            }
            CommandEffect::RefreshViewer(_) => {}
        }
        Ok(reply)
    }

    pub(crate) fn complete(&self, sender: ActorId, line: &str) -> Vec<String> {
        commands::complete(sender, line, &self.host.roster)
    }

    pub(crate) fn shutdown(&mut self) -> usize {
        self.service.shutdown(&mut self.host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANN: ActorId = ActorId(1);
    const BEN: ActorId = ActorId(2);

    fn pose_at(x: f64) -> Pose {
        Pose::new(Vec3::new(x, 64.0, 0.0), Vec3::new(0.0, 0.0, 1.0))
    }

    fn session() -> HostSession {
        let mut roster = AccessRoster::in_memory();
        roster.add_owner(ANN).expect("owner");
        roster.set_enabled(ANN, true).expect("enable");
        let mut session = HostSession::new(LabelConfig::default(), roster).expect("session");
        session.start();
        session.join(ANN, "Ann", pose_at(0.0));
        session.join(BEN, "Ben", pose_at(5.0));
        session
    }

    fn texts_of(session: &HostSession, id: ActorId) -> Vec<String> {
        let set = session
            .service()
            .engine()
            .label_set(id)
            .expect("tracked");
        set.handles()
            .iter()
            .map(|handle| {
                session
                    .host()
                    .world
                    .labels
                    .get(*handle)
                    .expect("live")
                    .text
                    .clone()
            })
            .collect()
    }

    #[test]
    fn first_tick_renders_placeholder_for_each_actor() {
        let mut session = session();
        let report = session.tick().expect("cadence 1");
        assert_eq!(report.rebuilt, 2);
        assert_eq!(texts_of(&session, BEN), vec!["（効果なし）".to_string()]);
    }

    #[test]
    fn enabled_owner_sees_other_labels_but_not_own() {
        let mut session = session();
        session.tick();
        let labels = &session.host().world.labels;
        let ben_handle = session.service().engine().label_set(BEN).expect("tracked").handles()[0];
        let ann_handle = session.service().engine().label_set(ANN).expect("tracked").handles()[0];

        assert!(labels.get(ben_handle).expect("live").visible_to.contains(&ANN));
        assert!(!labels.get(ann_handle).expect("live").visible_to.contains(&ANN));
        assert_eq!(labels.visible_count_for(BEN), 0);
    }

    #[test]
    fn conditions_render_after_tick() {
        let mut session = session();
        session.apply_condition(BEN, "POISON", 2, ConditionDuration::Ticks(131));
        session.apply_condition(BEN, "SPEED", 1, ConditionDuration::Unbounded);
        session.tick();

        assert_eq!(
            texts_of(&session, BEN),
            vec!["毒 II 0:06".to_string(), "移動速度 I ∞".to_string()]
        );
    }

    #[test]
    fn movement_repositions_without_rebuilding() {
        let mut session = session();
        session.tick();
        let before = session.service().engine().label_set(BEN).expect("tracked").handles().to_vec();

        let outcome = session.move_actor(BEN, Vec3::new(6.0, 64.0, 0.0));
        assert_eq!(outcome, Some(UpdateOutcome::Repositioned { rows: 1 }));
        let after = session.service().engine().label_set(BEN).expect("tracked").handles().to_vec();
        assert_eq!(before, after);
        let position = session.host().world.labels.get(after[0]).expect("live").position;
        assert!((position.y - (64.0 + 1.90)).abs() < 1e-9);
        assert!((position.x - 6.0).abs() < 1e-9);
    }

    #[test]
    fn toggling_off_hides_labels_for_sender() {
        let mut session = session();
        session.tick();
        assert_eq!(session.host().world.labels.visible_count_for(ANN), 1);

        let reply = session.run_command(ANN, "/open effect off").expect("run");
        assert_eq!(reply.lines.len(), 1);
        assert_eq!(session.host().world.labels.visible_count_for(ANN), 0);
    }

    #[test]
    fn adding_member_who_enabled_earlier_refreshes_visibility() {
        let mut session = session();
        session.tick();
        session
            .run_command(ANN, "/openeffect add member Ben")
            .expect("add");
        assert_eq!(session.host().world.labels.visible_count_for(BEN), 0);

        session.run_command(BEN, "/open effect on").expect("toggle");
        assert_eq!(session.host().world.labels.visible_count_for(BEN), 1);

        session
            .run_command(ANN, "/openeffect remove member Ben")
            .expect("remove");
        assert_eq!(session.host().world.labels.visible_count_for(BEN), 0);
    }

    #[test]
    fn disconnect_without_leave_is_swept_on_next_tick() {
        let mut session = session();
        session.tick();
        assert_eq!(session.host().world.labels.live_count(), 2);

        assert!(session.disconnect(BEN));
        let report = session.tick().expect("cadence 1");
        assert_eq!(report.pruned, vec![BEN]);
        assert_eq!(session.host().world.labels.live_count(), 1);
        assert!(!session.service().engine().is_tracked(BEN));
    }

    #[test]
    fn leave_releases_labels_immediately() {
        let mut session = session();
        session.tick();
        assert!(session.leave(BEN));
        assert_eq!(session.host().world.labels.live_count(), 1);
        assert!(!session.leave(BEN));
    }

    #[test]
    fn shutdown_destroys_every_label() {
        let mut session = session();
        session.apply_condition(ANN, "REGENERATION", 2, ConditionDuration::Ticks(400));
        session.apply_condition(ANN, "ABSORPTION", 1, ConditionDuration::Ticks(400));
        session.tick();

        assert_eq!(session.shutdown(), 2);
        assert_eq!(session.host().world.labels.live_count(), 0);
    }

    #[test]
    fn completion_goes_through_roster() {
        let session = session();
        assert_eq!(session.complete(ANN, "/openeffect re"), vec!["remove"]);
        assert!(session.complete(BEN, "/openeffect re").is_empty());
    }
}
