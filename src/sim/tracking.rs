//! People reported by the motion tracker
//!
//! Positions are smoothed over the last few samples before they become
//! player input.

use std::collections::VecDeque;

use glam::Vec2;

use super::input::InputRecord;
use super::player::PlayerManager;
use crate::consts::TRACKING_SMOOTHING;
use crate::settings::Settings;

/// One person on the floor
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedPerson {
    pub id: u32,
    samples: VecDeque<Vec2>,
}

impl TrackedPerson {
    pub fn new(id: u32, pos: Vec2) -> Self {
        let mut samples = VecDeque::with_capacity(TRACKING_SMOOTHING);
        samples.push_back(pos);
        Self { id, samples }
    }

    /// Record a new sighting, dropping the oldest beyond the window
    pub fn set_location(&mut self, pos: Vec2) {
        if self.samples.len() >= TRACKING_SMOOTHING {
            self.samples.pop_front();
        }
        self.samples.push_back(pos);
    }

    /// Average of the recent sightings
    pub fn position(&self) -> Vec2 {
        let sum: Vec2 = self.samples.iter().copied().sum();
        sum / self.samples.len().max(1) as f32
    }
}

/// Everyone currently tracked, plus pending removals
#[derive(Debug, Clone, Default)]
pub struct PersonTracker {
    active: Vec<TrackedPerson>,
    scheduled_for_removal: Vec<u32>,
}

impl PersonTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a person; a known id only gets a new sighting
    pub fn add(&mut self, id: u32, pos: Vec2) {
        match self.get_mut(id) {
            Some(person) => person.set_location(pos),
            None => {
                log::debug!("Tracking person {id}");
                self.active.push(TrackedPerson::new(id, pos));
            }
        }
    }

    pub fn has(&self, id: u32) -> bool {
        self.active.iter().any(|p| p.id == id)
    }

    pub fn get(&self, id: u32) -> Option<&TrackedPerson> {
        self.active.iter().find(|p| p.id == id)
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut TrackedPerson> {
        self.active.iter_mut().find(|p| p.id == id)
    }

    /// Mark a person as gone; takes effect on `remove_scheduled`
    pub fn schedule_for_removal(&mut self, id: u32) {
        if self.has(id) && !self.scheduled_for_removal.contains(&id) {
            self.scheduled_for_removal.push(id);
        }
    }

    /// Drop everyone scheduled for removal, returning their ids
    pub fn remove_scheduled(&mut self) -> Vec<u32> {
        let removed = std::mem::take(&mut self.scheduled_for_removal);
        self.active.retain(|p| !removed.contains(&p.id));
        removed
    }

    /// One tracked input record per person, in tracking order
    pub fn generate_input(&self, frame_time: f32) -> Vec<InputRecord> {
        self.active
            .iter()
            .map(|p| InputRecord::tracked(p.id, p.position(), frame_time))
            .collect()
    }

    /// Mirror tracked people into players: create the new, drop the departed
    pub fn sync_players(&mut self, players: &mut PlayerManager, settings: &Settings) {
        let removed = self.remove_scheduled();
        if !removed.is_empty() {
            players.destroy_players(&removed);
        }
        for person in &self.active {
            players.get_or_create(person.id, settings);
        }
    }

    pub fn people(&self) -> &[TrackedPerson] {
        &self.active
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}
