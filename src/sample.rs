//! Demonstration suite
//!
//! Small arithmetic helpers and a `User` type, plus the cases the CLI runs
//! against them: plain assertions, subtests, table-driven cases, parallel
//! subtests, cleanup hooks, short-mode skips and benchmarks.

use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

use crate::registry::{Registry, RegistryError};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArithmeticError {
    #[error("division by zero")]
    DivisionByZero,
}

pub fn add(a: i32, b: i32) -> i32 {
    a.wrapping_add(b)
}

pub fn multiply(a: i32, b: i32) -> i32 {
    a.wrapping_mul(b)
}

/// Truncating division
pub fn divide(a: i32, b: i32) -> Result<i32, ArithmeticError> {
    if b == 0 {
        return Err(ArithmeticError::DivisionByZero);
    }
    Ok(a.wrapping_div(b))
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub name: String,
    pub email: String,
    pub age: u32,
}

impl User {
    pub fn new(name: impl Into<String>, email: impl Into<String>, age: u32) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            age,
        }
    }

    pub fn is_adult(&self) -> bool {
        self.age >= 18
    }

    /// Loose check: both `@` and `.` present
    pub fn validate_email(&self) -> bool {
        self.email.contains('@') && self.email.contains('.')
    }
}

const ADD_CASES: &[(&str, i32, i32, i32)] = &[
    ("positive numbers", 2, 3, 5),
    ("negative numbers", -2, -3, -5),
    ("mixed signs", -2, 3, 1),
    ("zero", 0, 0, 0),
    ("large numbers", 1000, 2000, 3000),
];

const ADULT_CASES: &[(&str, u32, bool)] = &[
    ("adult", 18, true),
    ("over 18", 25, true),
    ("minor", 17, false),
    ("child", 5, false),
];

const EMAIL_CASES: &[(&str, &str, bool)] = &[
    ("valid email", "user@example.com", true),
    ("no at symbol", "userexample.com", false),
    ("no domain", "user@", false),
    ("no local part", "@example.com", true),
    ("empty", "", false),
];

/// Register the demonstration cases and benchmarks
pub fn register_suite(registry: &mut Registry) -> Result<(), RegistryError> {
    registry.register("TestAdd", |t| {
        let result = add(2, 3);
        if result != 5 {
            t.fail(format!("add(2, 3) = {result}; want 5"));
        }
        Ok(())
    })?;

    registry.register("TestMultiply", |t| {
        let result = multiply(2, 3);
        if result != 6 {
            t.fail(format!("multiply(2, 3) = {result}; want 6"));
        }
        Ok(())
    })?;

    registry.register("TestDivide", |t| {
        t.run("success", |t| {
            match divide(10, 2) {
                Ok(5) => {}
                Ok(other) => t.fail(format!("divide(10, 2) = {other}; want 5")),
                Err(err) => return t.fatal(format!("unexpected error: {err}")),
            }
            Ok(())
        });

        t.run("division by zero", |t| {
            if divide(10, 0).is_ok() {
                t.fail("expected error for division by zero, got none");
            }
            Ok(())
        });
        Ok(())
    })?;

    registry.register("TestAddTableDriven", |t| {
        for &(name, a, b, expected) in ADD_CASES {
            t.run(name, move |t| {
                let result = add(a, b);
                if result != expected {
                    t.fail(format!("add({a}, {b}) = {result}; want {expected}"));
                }
                Ok(())
            });
        }
        Ok(())
    })?;

    registry.register("TestUserCreation", |t| {
        let user = User::new("Alice", "alice@example.com", 25);
        t.expect_eq(user.name.as_str(), "Alice");
        t.expect_eq(user.email.as_str(), "alice@example.com");
        t.expect_eq(user.age, 25);
        Ok(())
    })?;

    registry.register("TestUserIsAdult", |t| {
        for &(name, age, expected) in ADULT_CASES {
            t.run(name, move |t| {
                let result = User::new("Test", "test@example.com", age).is_adult();
                if result != expected {
                    t.fail(format!("is_adult() with age {age} = {result}; want {expected}"));
                }
                Ok(())
            });
        }
        Ok(())
    })?;

    registry.register("TestUserValidateEmail", |t| {
        for &(name, email, expected) in EMAIL_CASES {
            t.run(name, move |t| {
                let result = User::new("Test", email, 25).validate_email();
                if result != expected {
                    t.fail(format!("validate_email({email:?}) = {result}; want {expected}"));
                }
                Ok(())
            });
        }
        Ok(())
    })?;

    registry.register("TestWithHelper", |t| {
        t.expect_eq(add(2, 3), 5);
        Ok(())
    })?;

    registry.register("TestParallel", |t| {
        t.run("group", |t| {
            t.run("test1", |t| {
                t.parallel();
                t.expect_eq(add(1, 1), 2);
                Ok(())
            });
            t.run("test2", |t| {
                t.parallel();
                t.expect_eq(add(2, 2), 4);
                Ok(())
            });
            Ok(())
        });
        Ok(())
    })?;

    registry.register("TestWithCleanup", |t| {
        let data = Arc::new(Mutex::new(Vec::new()));

        let hook_data = Arc::clone(&data);
        t.cleanup(move || {
            hook_data
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clear();
        });

        let len = {
            let mut data = data.lock().unwrap_or_else(PoisonError::into_inner);
            data.extend([1, 2, 3]);
            data.len()
        };
        if len != 3 {
            t.fail(format!("len(data) = {len}; want 3"));
        }
        Ok(())
    })?;

    registry.register("TestSkipped", |t| {
        if t.is_short_mode() {
            return t.skip("skipping test in short mode");
        }
        t.log("long-running checks completed");
        Ok(())
    })?;

    registry.register_benchmark("BenchmarkAdd", |b| b.iter(|| add(2, 3)))?;
    registry.register_benchmark("BenchmarkMultiply", |b| b.iter(|| multiply(2, 3)))?;

    Ok(())
}

/// A registry holding only the demonstration suite
pub fn suite() -> Result<Registry, RegistryError> {
    let mut registry = Registry::new();
    register_suite(&mut registry)?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add() {
        assert_eq!(add(2, 3), 5);
        assert_eq!(add(-1, 1), 0);
        assert_eq!(add(i32::MAX, 1), i32::MIN);
    }

    #[test]
    fn test_multiply() {
        assert_eq!(multiply(2, 3), 6);
        assert_eq!(multiply(-2, 3), -6);
        assert_eq!(multiply(0, 100), 0);
    }

    #[test]
    fn test_divide() {
        assert_eq!(divide(10, 2), Ok(5));
        assert_eq!(divide(7, 2), Ok(3));
        assert_eq!(divide(-7, 2), Ok(-3));
        assert_eq!(divide(10, 0), Err(ArithmeticError::DivisionByZero));
        assert_eq!(divide(0, 0), Err(ArithmeticError::DivisionByZero));
    }

    #[test]
    fn test_is_adult_boundary() {
        assert!(User::new("a", "a@b.c", 18).is_adult());
        assert!(!User::new("a", "a@b.c", 17).is_adult());
    }

    #[test]
    fn test_validate_email() {
        assert!(User::new("a", "user@example.com", 1).validate_email());
        assert!(!User::new("a", "user@", 1).validate_email());
        assert!(!User::new("a", "", 1).validate_email());
        assert!(!User::new("a", "userexample.com", 1).validate_email());
    }

    #[test]
    fn test_suite_registers_everything() {
        let registry = suite().unwrap();
        assert_eq!(registry.len(), 11);
        assert_eq!(registry.benchmarks().len(), 2);
        assert_eq!(registry.cases()[0].name(), "TestAdd");
    }
}
