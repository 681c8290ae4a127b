//! Execution planner - collects and filters resources

use crate::resource::{BoxedResource, Resource};

/// An ordered list of resources to reconcile
///
/// Resources run in insertion order; a later entry may depend on an earlier
/// one (a volume attached to an instance using a profile created above it).
#[derive(Default)]
pub struct ExecutionPlan {
    pub resources: Vec<BoxedResource>,
}

impl ExecutionPlan {
    /// Create a new empty plan
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a resource to the plan
    pub fn add_resource(&mut self, resource: BoxedResource) {
        self.resources.push(resource);
    }

    /// Filter plan to only include resources matching a predicate
    pub fn filter<F>(self, predicate: F) -> Self
    where
        F: Fn(&dyn Resource) -> bool,
    {
        Self {
            resources: self
                .resources
                .into_iter()
                .filter(|r| predicate(r.as_ref()))
                .collect(),
        }
    }

    /// Filter plan to only include resources matching a target pattern
    ///
    /// Target format: "type" or "type.id"
    pub fn filter_by_target(self, target: Option<&str>) -> Self {
        match target {
            None => self,
            Some(t) => {
                let (resource_type, id) = parse_target(t);
                self.filter(|r| matches_filter(r, resource_type.as_deref(), id.as_deref()))
            }
        }
    }

    /// Total number of resources in the plan
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Check if plan is empty
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// Parse a target string like "type.id" into (type, id)
///
/// Only the first dot separates; ids such as `default/data.v2` keep theirs.
fn parse_target(target: &str) -> (Option<String>, Option<String>) {
    match target.split_once('.') {
        None => (Some(target.to_string()), None),
        Some((resource_type, id)) if !resource_type.is_empty() && !id.is_empty() => {
            (Some(resource_type.to_string()), Some(id.to_string()))
        }
        _ => (None, Some(target.to_string())),
    }
}

/// Check if a resource matches the filter criteria
fn matches_filter(resource: &dyn Resource, resource_type: Option<&str>, id: Option<&str>) -> bool {
    if let Some(rt) = resource_type {
        // Allow plural aliases
        let matches_type = match rt {
            "profiles" => resource.resource_type() == "profile",
            "volumes" => resource.resource_type() == "volume",
            _ => resource.resource_type() == rt,
        };
        if !matches_type {
            return false;
        }
    }

    if let Some(n) = id
        && resource.id() != n
    {
        return false;
    }

    true
}
