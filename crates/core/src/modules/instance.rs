use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::sync::{Arc, Mutex, Weak};
use uuid::Uuid;

/// Live instances tracked by one factory, in creation order
pub(crate) type InstanceList = Mutex<Vec<ModuleInstance>>;

/// Unique identifier of a module instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceId(Uuid);

impl InstanceId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An object built from a structured module definition
///
/// Clones share the underlying object. Two instances are equal only when
/// they are the same object.
#[derive(Clone)]
pub struct ModuleInstance {
    id: InstanceId,
    module: String,
    value: Arc<dyn Any + Send + Sync>,
}

impl ModuleInstance {
    pub(crate) fn new(module: impl Into<String>, value: Arc<dyn Any + Send + Sync>) -> Self {
        Self {
            id: InstanceId::new(),
            module: module.into(),
            value,
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// Name of the module this instance was built from
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Borrow the instance as its concrete type
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Get a shared handle to the instance as its concrete type
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.value.clone().downcast::<T>().ok()
    }

    /// Check if both handles point at the same object
    pub fn ptr_eq(&self, other: &ModuleInstance) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

impl PartialEq for ModuleInstance {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.ptr_eq(other)
    }
}

impl Eq for ModuleInstance {}

impl fmt::Debug for ModuleInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleInstance")
            .field("id", &self.id)
            .field("module", &self.module)
            .finish()
    }
}

/// Token that removes one instance from its factory's tracked instances
///
/// Handed out alongside every structured instance. The handle does not keep
/// the factory alive; once the factory is gone, detaching does nothing.
#[derive(Debug, Clone)]
pub struct DetachHandle {
    id: InstanceId,
    module: String,
    instances: Weak<InstanceList>,
    trace: bool,
}

impl DetachHandle {
    pub(crate) fn new(
        instance: &ModuleInstance,
        instances: &Arc<InstanceList>,
        trace: bool,
    ) -> Self {
        Self {
            id: instance.id(),
            module: instance.module().to_string(),
            instances: Arc::downgrade(instances),
            trace,
        }
    }

    pub fn instance_id(&self) -> InstanceId {
        self.id
    }

    /// Remove the instance from its factory
    ///
    /// Returns `false` when the instance was already detached or the factory
    /// no longer exists.
    pub fn detach(&self) -> bool {
        let Some(instances) = self.instances.upgrade() else {
            return false;
        };

        let removed = remove_instance(&instances, self.id);
        if removed && self.trace {
            tracing::debug!("Detached instance {} of module '{}'", self.id, self.module);
        }
        removed
    }

    /// Check if the instance is still tracked by its factory
    pub fn is_attached(&self) -> bool {
        let Some(instances) = self.instances.upgrade() else {
            return false;
        };

        let attached = lock(&instances).iter().any(|i| i.id() == self.id);
        attached
    }
}

/// Lock the tracked instances, recovering from poisoning
///
/// Every critical section is a single push or remove, so a poisoned list
/// is still consistent.
pub(crate) fn lock(instances: &InstanceList) -> std::sync::MutexGuard<'_, Vec<ModuleInstance>> {
    instances.lock().unwrap_or_else(|p| p.into_inner())
}

/// Remove exactly one instance by id, keeping the order of the rest
pub(crate) fn remove_instance(instances: &InstanceList, id: InstanceId) -> bool {
    let mut guard = lock(instances);
    match guard.iter().position(|i| i.id() == id) {
        Some(index) => {
            guard.remove(index);
            true
        }
        None => false,
    }
}
