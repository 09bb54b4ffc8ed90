use std::collections::{BTreeMap, BTreeSet};

use label_engine::{
    ActiveCondition, ActorId, BackendError, ConditionDuration, LabelHandle, Pose, TargetSnapshot,
    Vec3,
};

#[derive(Debug, Clone)]
pub(crate) struct SimActor {
    pub(crate) id: ActorId,
    pub(crate) name: String,
    pub(crate) pose: Pose,
    conditions: Vec<ActiveCondition>,
}

impl SimActor {
    pub(crate) fn snapshot(&self) -> TargetSnapshot {
        TargetSnapshot {
            id: self.id,
            name: Some(self.name.clone()),
            pose: self.pose,
        }
    }

    pub(crate) fn conditions(&self) -> &[ActiveCondition] {
        &self.conditions
    }
}

/// Online actors keyed by id, plus every name ever seen so roster commands can resolve
/// players who are currently offline.
#[derive(Debug, Default)]
pub(crate) struct SimWorld {
    actors: BTreeMap<ActorId, SimActor>,
    known_names: BTreeMap<ActorId, String>,
    pub(crate) labels: LabelArena,
}

impl SimWorld {
    pub(crate) fn join(&mut self, id: ActorId, name: &str, pose: Pose) -> TargetSnapshot {
        let actor = SimActor {
            id,
            name: name.to_string(),
            pose,
            conditions: Vec::new(),
        };
        let snapshot = actor.snapshot();
        self.known_names.insert(id, name.to_string());
        self.actors.insert(id, actor);
        snapshot
    }

    pub(crate) fn leave(&mut self, id: ActorId) -> bool {
        self.actors.remove(&id).is_some()
    }

    pub(crate) fn actor(&self, id: ActorId) -> Option<&SimActor> {
        self.actors.get(&id)
    }

    pub(crate) fn actors(&self) -> impl Iterator<Item = &SimActor> {
        self.actors.values()
    }

    pub(crate) fn is_online(&self, id: ActorId) -> bool {
        self.actors.contains_key(&id)
    }

    /// Moves an actor's eye position. Returns the previous and new position.
    pub(crate) fn move_to(&mut self, id: ActorId, eye_position: Vec3) -> Option<(Vec3, Vec3)> {
        let actor = self.actors.get_mut(&id)?;
        let from = actor.pose.eye_position;
        actor.pose.eye_position = eye_position;
        Some((from, eye_position))
    }

    pub(crate) fn face(&mut self, id: ActorId, facing: Vec3) -> bool {
        let Some(actor) = self.actors.get_mut(&id) else {
            return false;
        };
        actor.pose.facing = facing;
        true
    }

    /// Applies a condition, replacing any active condition of the same kind.
    pub(crate) fn apply_condition(
        &mut self,
        id: ActorId,
        kind: &str,
        intensity: u32,
        remaining: ConditionDuration,
    ) -> bool {
        let Some(actor) = self.actors.get_mut(&id) else {
            return false;
        };
        actor
            .conditions
            .retain(|condition| condition.kind.as_str() != kind);
        actor
            .conditions
            .push(ActiveCondition::new(kind, intensity, remaining));
        true
    }

    pub(crate) fn clear_conditions(&mut self, id: ActorId) -> bool {
        let Some(actor) = self.actors.get_mut(&id) else {
            return false;
        };
        actor.conditions.clear();
        true
    }

    /// Counts every bounded condition down by one tick and drops the ones that ran out.
    /// Returns how many expired.
    pub(crate) fn advance_conditions(&mut self) -> usize {
        let mut expired = 0;
        for actor in self.actors.values_mut() {
            let before = actor.conditions.len();
            actor.conditions.retain_mut(|condition| match &mut condition.remaining {
                ConditionDuration::Ticks(ticks) => {
                    *ticks -= 1;
                    *ticks > 0
                }
                ConditionDuration::Unbounded => true,
            });
            expired += before - actor.conditions.len();
        }
        expired
    }

    pub(crate) fn resolve_name(&self, name: &str) -> Option<ActorId> {
        self.known_names
            .iter()
            .find(|(_, known)| known.eq_ignore_ascii_case(name))
            .map(|(id, _)| *id)
    }

    pub(crate) fn display_name(&self, id: ActorId) -> Option<&str> {
        self.known_names.get(&id).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LabelObject {
    pub(crate) position: Vec3,
    pub(crate) text: String,
    pub(crate) visible_to: BTreeSet<ActorId>,
}

#[derive(Debug, Default)]
struct LabelSlot {
    generation: u32,
    object: Option<LabelObject>,
}

/// Slot storage for label objects. Freed slots are recycled with a bumped generation so an
/// old handle can never reach the object that replaced it.
#[derive(Debug, Default)]
pub(crate) struct LabelArena {
    slots: Vec<LabelSlot>,
    free: Vec<u32>,
    live: usize,
}

impl LabelArena {
    pub(crate) fn spawn(&mut self, position: Vec3, text: &str) -> Result<LabelHandle, BackendError> {
        let object = LabelObject {
            position,
            text: text.to_string(),
            visible_to: BTreeSet::new(),
        };
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                let index = u32::try_from(self.slots.len()).map_err(|_| BackendError::Rejected {
                    reason: "label arena is full".to_string(),
                })?;
                self.slots.push(LabelSlot::default());
                index
            }
        };
        let slot = &mut self.slots[index as usize];
        slot.object = Some(object);
        self.live += 1;
        Ok(LabelHandle {
            index,
            generation: slot.generation,
        })
    }

    pub(crate) fn destroy(&mut self, handle: LabelHandle) -> Result<(), BackendError> {
        self.get(handle)?;
        let slot = &mut self.slots[handle.index as usize];
        slot.object = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.live -= 1;
        Ok(())
    }

    pub(crate) fn get(&self, handle: LabelHandle) -> Result<&LabelObject, BackendError> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.object.as_ref())
            .ok_or(BackendError::StaleHandle(handle))
    }

    pub(crate) fn get_mut(&mut self, handle: LabelHandle) -> Result<&mut LabelObject, BackendError> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.object.as_mut())
            .ok_or(BackendError::StaleHandle(handle))
    }

    pub(crate) fn live_count(&self) -> usize {
        self.live
    }

    /// Drops a viewer from every visibility set, e.g. when they disconnect.
    pub(crate) fn forget_viewer(&mut self, viewer: ActorId) {
        for object in self.slots.iter_mut().filter_map(|slot| slot.object.as_mut()) {
            object.visible_to.remove(&viewer);
        }
    }

    #[cfg(test)]
    pub(crate) fn visible_count_for(&self, viewer: ActorId) -> usize {
        self.slots
            .iter()
            .filter_map(|slot| slot.object.as_ref())
            .filter(|object| object.visible_to.contains(&viewer))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pose_at(x: f64) -> Pose {
        Pose::new(Vec3::new(x, 64.0, 0.0), Vec3::new(0.0, 0.0, 1.0))
    }

    #[test]
    fn recycled_slot_rejects_old_handle() {
        let mut arena = LabelArena::default();
        let first = arena.spawn(Vec3::ZERO, "a").expect("spawn");
        arena.destroy(first).expect("destroy");
        let second = arena.spawn(Vec3::ZERO, "b").expect("spawn");

        assert_eq!(first.index, second.index);
        assert_ne!(first.generation, second.generation);
        assert_eq!(arena.get(first), Err(BackendError::StaleHandle(first)));
        assert_eq!(arena.get(second).expect("live").text, "b");
        assert_eq!(arena.live_count(), 1);
    }

    #[test]
    fn destroying_twice_is_stale() {
        let mut arena = LabelArena::default();
        let handle = arena.spawn(Vec3::ZERO, "").expect("spawn");
        arena.destroy(handle).expect("destroy");
        assert_eq!(arena.destroy(handle), Err(BackendError::StaleHandle(handle)));
        assert_eq!(arena.live_count(), 0);
    }

    #[test]
    fn spawned_objects_start_hidden() {
        let mut arena = LabelArena::default();
        let handle = arena.spawn(Vec3::ZERO, "x").expect("spawn");
        assert!(arena.get(handle).expect("live").visible_to.is_empty());
    }

    #[test]
    fn conditions_count_down_and_expire() {
        let mut world = SimWorld::default();
        world.join(ActorId(1), "Ann", pose_at(0.0));
        world.apply_condition(ActorId(1), "poison", 1, ConditionDuration::Ticks(2));
        world.apply_condition(ActorId(1), "speed", 0, ConditionDuration::Unbounded);

        assert_eq!(world.advance_conditions(), 0);
        assert_eq!(world.advance_conditions(), 1);
        let remaining = world.actor(ActorId(1)).expect("online").conditions();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].kind.as_str(), "speed");
    }

    #[test]
    fn reapplying_condition_replaces_it() {
        let mut world = SimWorld::default();
        world.join(ActorId(1), "Ann", pose_at(0.0));
        world.apply_condition(ActorId(1), "poison", 0, ConditionDuration::Ticks(20));
        world.apply_condition(ActorId(1), "poison", 2, ConditionDuration::Ticks(40));

        let conditions = world.actor(ActorId(1)).expect("online").conditions();
        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].intensity, 2);
    }

    #[test]
    fn names_resolve_after_leaving() {
        let mut world = SimWorld::default();
        world.join(ActorId(4), "Dana", pose_at(0.0));
        assert!(world.leave(ActorId(4)));
        assert!(!world.is_online(ActorId(4)));
        assert_eq!(world.resolve_name("dana"), Some(ActorId(4)));
        assert_eq!(world.display_name(ActorId(4)), Some("Dana"));
    }

    #[test]
    fn move_reports_previous_position() {
        let mut world = SimWorld::default();
        world.join(ActorId(1), "Ann", pose_at(0.0));
        let (from, to) = world
            .move_to(ActorId(1), Vec3::new(2.0, 64.0, 0.0))
            .expect("online");
        assert_eq!(from, Vec3::new(0.0, 64.0, 0.0));
        assert_eq!(to, Vec3::new(2.0, 64.0, 0.0));
        assert!(world.move_to(ActorId(9), Vec3::ZERO).is_none());
    }
}
