//! Circular construction detection.

use std::cell::RefCell;

use crate::error::{DiError, DiResult};

const MAX_DEPTH: usize = 1024;

/// Stack of classes currently under construction in one container.
///
/// Each constructor-parameter resolution pushes the class being built;
/// meeting a class that is already on the stack means the constructor
/// dependencies form a cycle.
#[derive(Default)]
pub(crate) struct ResolutionStack {
    stack: RefCell<Vec<String>>,
}

impl ResolutionStack {
    /// Pushes `name`, failing if it is already being built.
    pub(crate) fn enter(&self, name: &str) -> DiResult<StackGuard<'_>> {
        let mut stack = self.stack.borrow_mut();

        // Circular detection BEFORE pushing the new name
        if stack.iter().any(|n| n == name) {
            let mut path = stack.clone();
            path.push(name.to_string());
            return Err(DiError::invalid(format!("Circular dependency: {}", path.join(" -> "))));
        }

        if stack.len() >= MAX_DEPTH {
            return Err(DiError::invalid(format!(
                "Max construction depth {} exceeded while building {}",
                MAX_DEPTH, name
            )));
        }

        stack.push(name.to_string());
        Ok(StackGuard { stack: &self.stack })
    }

    #[cfg(test)]
    fn depth(&self) -> usize {
        self.stack.borrow().len()
    }
}

/// Pops the entry pushed by [`ResolutionStack::enter`] when dropped.
pub(crate) struct StackGuard<'a> {
    stack: &'a RefCell<Vec<String>>,
}

impl Drop for StackGuard<'_> {
    fn drop(&mut self) {
        self.stack.borrow_mut().pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_pops_on_drop() {
        let stack = ResolutionStack::default();
        {
            let _a = stack.enter("A").unwrap();
            let _b = stack.enter("B").unwrap();
            assert_eq!(stack.depth(), 2);
        }
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn test_reentry_reports_path() {
        let stack = ResolutionStack::default();
        let _a = stack.enter("A").unwrap();
        let _b = stack.enter("B").unwrap();
        match stack.enter("A") {
            Err(DiError::InvalidConfig(msg)) => assert_eq!(msg, "Circular dependency: A -> B -> A"),
            _ => panic!("Expected circular error"),
        }
        // The failed entry must not leave anything behind
        assert_eq!(stack.depth(), 2);
    }
}
