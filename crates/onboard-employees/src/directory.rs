//! Employee storage.

use std::collections::HashMap;
use std::path::Path;

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::errors::{EmployeeError, Result};
use crate::model::{Employee, EmployeeAttribute, EmployeeState, NewEmployee};

/// Employee records plus their onboarding state.
#[cfg_attr(test, mockall::automock)]
pub trait EmployeeDirectory: Send + Sync {
    /// The single employee whose `attribute` equals `value`.
    fn get_by_attribute(&self, attribute: EmployeeAttribute, value: &str) -> Result<Employee>;

    /// A page of employees in insertion order.
    fn list(&self, offset: usize, limit: usize) -> Vec<Employee>;

    /// Store a new employee. `internal_id` must be unique.
    fn create(&self, employee: NewEmployee) -> Result<Employee>;

    /// Replace the fields of the matching employee, keeping its `id`.
    fn update_by_attribute(
        &self,
        attribute: EmployeeAttribute,
        value: &str,
        employee: NewEmployee,
    ) -> Result<Employee>;

    /// Remove the matching employee and its state.
    fn delete_by_attribute(&self, attribute: EmployeeAttribute, value: &str) -> Result<Employee>;

    /// Onboarding state for `employee`.
    fn state(&self, employee: &Employee) -> Result<EmployeeState>;

    /// Create the initial state. Fails if one exists.
    fn create_state(&self, employee: &Employee) -> Result<EmployeeState>;

    /// Existing state, or a freshly created one.
    fn ensure_state(&self, employee: &Employee) -> Result<EmployeeState> {
        match self.state(employee) {
            Err(EmployeeError::StateNotFound(_)) => self.create_state(employee),
            other => other,
        }
    }

    /// Overwrite the progress flags of an existing state.
    fn update_state(&self, employee: &Employee, state: &EmployeeState) -> Result<EmployeeState>;
}

/// Process-local directory guarded by `parking_lot` locks.
#[derive(Debug, Default)]
pub struct InMemoryEmployeeDirectory {
    employees: RwLock<Vec<Employee>>,
    states: RwLock<HashMap<String, EmployeeState>>,
}

impl InMemoryEmployeeDirectory {
    /// Empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory seeded from a JSON array of employees.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let seeds: Vec<NewEmployee> = serde_json::from_str(&content)?;
        let dir = Self::new();
        for seed in seeds {
            let _ = dir.create(seed)?;
        }
        info!(?path, count = dir.len(), "seeded employee directory");
        Ok(dir)
    }

    /// Number of employees.
    pub fn len(&self) -> usize {
        self.employees.read().len()
    }

    /// Whether the directory holds no employees.
    pub fn is_empty(&self) -> bool {
        self.employees.read().is_empty()
    }

    fn not_found(attribute: EmployeeAttribute, value: &str) -> EmployeeError {
        EmployeeError::NotFound {
            attribute,
            value: value.to_owned(),
        }
    }
}

impl EmployeeDirectory for InMemoryEmployeeDirectory {
    fn get_by_attribute(&self, attribute: EmployeeAttribute, value: &str) -> Result<Employee> {
        self.employees
            .read()
            .iter()
            .find(|e| attribute.matches(e, value))
            .cloned()
            .ok_or_else(|| Self::not_found(attribute, value))
    }

    fn list(&self, offset: usize, limit: usize) -> Vec<Employee> {
        self.employees
            .read()
            .iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect()
    }

    fn create(&self, employee: NewEmployee) -> Result<Employee> {
        let mut employees = self.employees.write();
        if employees.iter().any(|e| e.internal_id == employee.internal_id) {
            return Err(EmployeeError::AlreadyExists(employee.internal_id));
        }
        let employee = employee.into_employee();
        debug!(internal_id = %employee.internal_id, "employee created");
        employees.push(employee.clone());
        Ok(employee)
    }

    fn update_by_attribute(
        &self,
        attribute: EmployeeAttribute,
        value: &str,
        update: NewEmployee,
    ) -> Result<Employee> {
        let mut employees = self.employees.write();
        if employees
            .iter()
            .any(|e| e.internal_id == update.internal_id && !attribute.matches(e, value))
        {
            return Err(EmployeeError::AlreadyExists(update.internal_id));
        }
        let slot = employees
            .iter_mut()
            .find(|e| attribute.matches(e, value))
            .ok_or_else(|| Self::not_found(attribute, value))?;
        slot.internal_id = update.internal_id;
        slot.email = update.email;
        slot.code_to_print = update.code_to_print;
        slot.surname = update.surname;
        slot.firstname = update.firstname;
        Ok(slot.clone())
    }

    fn delete_by_attribute(&self, attribute: EmployeeAttribute, value: &str) -> Result<Employee> {
        let mut employees = self.employees.write();
        let idx = employees
            .iter()
            .position(|e| attribute.matches(e, value))
            .ok_or_else(|| Self::not_found(attribute, value))?;
        let removed = employees.remove(idx);
        let _ = self.states.write().remove(&removed.internal_id);
        Ok(removed)
    }

    fn state(&self, employee: &Employee) -> Result<EmployeeState> {
        self.states
            .read()
            .get(&employee.internal_id)
            .cloned()
            .ok_or_else(|| EmployeeError::StateNotFound(employee.internal_id.clone()))
    }

    fn create_state(&self, employee: &Employee) -> Result<EmployeeState> {
        let mut states = self.states.write();
        if states.contains_key(&employee.internal_id) {
            return Err(EmployeeError::StateAlreadyExists(
                employee.internal_id.clone(),
            ));
        }
        let state = EmployeeState::for_employee(employee);
        let _ = states.insert(employee.internal_id.clone(), state.clone());
        Ok(state)
    }

    // Single write lock so concurrent callers cannot both create.
    fn ensure_state(&self, employee: &Employee) -> Result<EmployeeState> {
        let mut states = self.states.write();
        let state = states
            .entry(employee.internal_id.clone())
            .or_insert_with(|| EmployeeState::for_employee(employee));
        Ok(state.clone())
    }

    fn update_state(&self, employee: &Employee, state: &EmployeeState) -> Result<EmployeeState> {
        let mut states = self.states.write();
        let slot = states
            .get_mut(&employee.internal_id)
            .ok_or_else(|| EmployeeError::StateNotFound(employee.internal_id.clone()))?;
        slot.email_code_sent = state.email_code_sent;
        slot.email_code_validated = state.email_code_validated;
        Ok(slot.clone())
    }
}
