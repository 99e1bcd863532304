//! Invocation discipline of `Payload` against recording shells.

use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::{Value, json};

use super::builtin::{CurrentUser, UploadFile};
use super::{BasePayload, Mode, Payload, PayloadLogic, ShellAccess};
use crate::error::{PayloadError, ShellError};
use crate::shell::testing::RecordingShell;
use crate::shell::{Operation, OperationSet};

/// Interactive hook executes the argument; structured hook never touches the shell.
#[derive(Default)]
struct Executable {
    interactive_calls: AtomicUsize,
    structured_calls: AtomicUsize,
}

impl PayloadLogic for Executable {
    fn name(&self) -> &str {
        "executable"
    }

    fn interactive_requirements(&self) -> OperationSet {
        OperationSet::from([Operation::Execute])
    }

    fn run_interactive(
        &self,
        shell: &ShellAccess<'_>,
        argument: &str,
    ) -> Result<String, PayloadError> {
        self.interactive_calls.fetch_add(1, Ordering::SeqCst);
        shell.execute(argument)
    }

    fn run_structured(
        &self,
        _shell: &ShellAccess<'_>,
        argument: &str,
    ) -> Result<Value, PayloadError> {
        self.structured_calls.fetch_add(1, Ordering::SeqCst);
        Ok(json!({ "command": argument }))
    }
}

/// Declares `read` but tries to `execute` as well.
struct Overreaching;

impl PayloadLogic for Overreaching {
    fn name(&self) -> &str {
        "overreaching"
    }

    fn interactive_requirements(&self) -> OperationSet {
        OperationSet::from([Operation::Read])
    }

    fn run_interactive(
        &self,
        shell: &ShellAccess<'_>,
        argument: &str,
    ) -> Result<String, PayloadError> {
        let content = shell.read(argument)?;
        shell.execute(&format!("echo {}", content))
    }
}

/// Different requirements per mode.
struct SplitModes;

impl PayloadLogic for SplitModes {
    fn name(&self) -> &str {
        "split"
    }

    fn interactive_requirements(&self) -> OperationSet {
        OperationSet::from([Operation::Execute])
    }

    fn structured_requirements(&self) -> OperationSet {
        OperationSet::from([Operation::Read, Operation::Write])
    }

    fn run_structured(
        &self,
        shell: &ShellAccess<'_>,
        argument: &str,
    ) -> Result<Value, PayloadError> {
        let before = shell.read(argument)?;
        shell.write(argument, "patched")?;
        Ok(json!({ "before": before }))
    }
}

/// Needs a payload that itself needs `upload`.
struct Stager;

impl PayloadLogic for Stager {
    fn name(&self) -> &str {
        "stager"
    }

    fn interactive_requirements(&self) -> OperationSet {
        OperationSet::from([Operation::Execute])
    }

    fn nested(&self) -> Vec<&dyn PayloadLogic> {
        vec![&UploadFile as &dyn PayloadLogic]
    }

    fn run_interactive(
        &self,
        shell: &ShellAccess<'_>,
        argument: &str,
    ) -> Result<String, PayloadError> {
        let staged = shell.exec_payload(&UploadFile, argument)?;
        let destination = staged["destination"].as_str().unwrap_or_default();
        shell.execute(&format!("chmod +x {}", destination))
    }
}

/// Runs `current_user` without listing it as nested.
struct Smuggler;

impl PayloadLogic for Smuggler {
    fn name(&self) -> &str {
        "smuggler"
    }

    fn interactive_requirements(&self) -> OperationSet {
        OperationSet::from([Operation::Execute])
    }

    fn run_interactive(
        &self,
        shell: &ShellAccess<'_>,
        _argument: &str,
    ) -> Result<String, PayloadError> {
        let user = shell.exec_payload(&CurrentUser, "")?;
        Ok(user["user"].as_str().unwrap_or_default().to_string())
    }
}

#[test]
fn test_zero_requirements_unbound_is_runnable() {
    assert!(Payload::unbound(&BasePayload).can_run().is_empty());
}

#[test]
fn test_can_run_is_set_difference() {
    struct Needs(Vec<Operation>);

    impl PayloadLogic for Needs {
        fn name(&self) -> &str {
            "needs"
        }

        fn interactive_requirements(&self) -> OperationSet {
            self.0.iter().copied().collect()
        }
    }

    let shell = RecordingShell::new([Operation::Read, Operation::Upload]);
    let forward = Needs(vec![Operation::Execute, Operation::Read, Operation::Unlink]);
    let backward = Needs(vec![Operation::Unlink, Operation::Read, Operation::Execute]);
    let expected = OperationSet::from([Operation::Execute, Operation::Unlink]);

    assert_eq!(Payload::new(&shell, &forward).can_run(), expected);
    assert_eq!(Payload::new(&shell, &backward).can_run(), expected);
    assert_eq!(Payload::unbound(&forward).can_run().len(), 3);
}

#[test]
fn test_missing_capability_performs_no_delegation() {
    let shell = RecordingShell::new([Operation::Read]);
    let logic = Executable::default();
    let payload = Payload::new(&shell, &logic);

    assert_eq!(payload.can_run(), OperationSet::from([Operation::Execute]));

    let err = payload.run("whoami").unwrap_err();
    match err {
        PayloadError::MissingCapability {
            payload,
            operation,
            missing,
        } => {
            assert_eq!(payload, "executable");
            assert_eq!(operation, Operation::Execute);
            assert_eq!(missing, OperationSet::from([Operation::Execute]));
        }
        other => panic!("expected MissingCapability, got {:?}", other),
    }

    assert_eq!(logic.interactive_calls.load(Ordering::SeqCst), 0);
    assert!(shell.calls().is_empty());
}

#[test]
fn test_run_and_run_api_are_independent() {
    let shell = RecordingShell::new([Operation::Execute]).respond("whoami", "root\n");
    let logic = Executable::default();
    let payload = Payload::new(&shell, &logic);

    assert!(payload.can_run().is_empty());

    assert_eq!(payload.run("whoami").unwrap(), "root\n");
    assert_eq!(logic.interactive_calls.load(Ordering::SeqCst), 1);
    assert_eq!(logic.structured_calls.load(Ordering::SeqCst), 0);
    assert_eq!(shell.calls_to(Operation::Execute), vec!["whoami"]);

    assert_eq!(payload.run_api("whoami").unwrap(), json!({ "command": "whoami" }));
    assert_eq!(logic.interactive_calls.load(Ordering::SeqCst), 1);
    assert_eq!(logic.structured_calls.load(Ordering::SeqCst), 1);
    assert_eq!(shell.calls_to(Operation::Execute), vec!["whoami"]);
}

#[test]
fn test_base_payload_unbound_never_runs() {
    let payload = Payload::unbound(&BasePayload);

    assert!(payload.can_run().is_empty());

    let err = payload.run("filename").unwrap_err();
    assert_eq!(err.missing_operation(), Some(Operation::Execute));
    let err = payload.run_api("filename").unwrap_err();
    assert_eq!(err.missing_operation(), Some(Operation::Execute));
}

#[test]
fn test_base_payload_does_not_use_undeclared_execute() {
    let shell = RecordingShell::new([Operation::Execute]);
    let err = Payload::new(&shell, &BasePayload).run("id").unwrap_err();

    assert_eq!(err.missing_operation(), Some(Operation::Execute));
    assert!(shell.calls().is_empty());
}

#[test]
fn test_hook_cannot_use_undeclared_operation() {
    let shell = RecordingShell::new([Operation::Read, Operation::Execute])
        .respond("/etc/issue", "Debian");
    let err = Payload::new(&shell, &Overreaching).run("/etc/issue").unwrap_err();

    assert_eq!(err.missing_operation(), Some(Operation::Execute));
    assert_eq!(shell.calls_to(Operation::Read), vec!["/etc/issue"]);
    assert!(shell.calls_to(Operation::Execute).is_empty());
}

#[test]
fn test_shell_errors_pass_through() {
    let shell = RecordingShell::new([Operation::Execute]).fail_with("broken pipe");
    let logic = Executable::default();
    let err = Payload::new(&shell, &logic).run("id").unwrap_err();

    match err {
        PayloadError::Shell(ShellError::Transport(message)) => assert_eq!(message, "broken pipe"),
        other => panic!("expected shell error, got {:?}", other),
    }
    assert_eq!(shell.calls_to(Operation::Execute), vec!["id"]);
}

#[test]
fn test_modes_checked_against_their_own_requirements() {
    let shell = RecordingShell::new([Operation::Read, Operation::Write]).respond("/etc/motd", "hi");
    let payload = Payload::new(&shell, &SplitModes);

    assert_eq!(payload.can_run_mode(Mode::Structured), OperationSet::new());
    assert_eq!(payload.can_run_mode(Mode::Interactive), OperationSet::from([Operation::Execute]));
    assert_eq!(payload.can_run(), OperationSet::from([Operation::Execute]));

    assert_eq!(payload.run_api("/etc/motd").unwrap(), json!({ "before": "hi" }));
    assert_eq!(shell.calls_to(Operation::Write), vec!["/etc/motd"]);

    let err = payload.run("/etc/motd").unwrap_err();
    assert_eq!(err.missing_operation(), Some(Operation::Execute));
}

#[test]
fn test_nested_requirements_count_towards_can_run() {
    let exec_only = RecordingShell::new([Operation::Execute]);
    let payload = Payload::new(&exec_only, &Stager);

    assert_eq!(payload.can_run(), OperationSet::from([Operation::Upload]));
    assert_eq!(
        payload.requirements(Mode::Interactive),
        OperationSet::from([Operation::Execute, Operation::Upload])
    );

    let err = payload.run("/tmp/a.sh id").unwrap_err();
    match err {
        PayloadError::MissingCapability {
            payload,
            operation,
            ..
        } => {
            assert_eq!(payload, "stager");
            assert_eq!(operation, Operation::Upload);
        }
        other => panic!("expected MissingCapability, got {:?}", other),
    }
    assert!(exec_only.calls().is_empty());

    let shell = RecordingShell::new([Operation::Execute, Operation::Upload]);
    let payload = Payload::new(&shell, &Stager);
    assert!(payload.can_run().is_empty());
    assert_eq!(payload.run("/tmp/a.sh id").unwrap(), "chmod +x /tmp/a.sh");
    assert_eq!(shell.calls_to(Operation::Upload), vec!["/tmp/a.sh"]);
}

#[test]
fn test_undeclared_nested_payload_is_refused() {
    let shell = RecordingShell::new([Operation::Execute]).respond("whoami", "root\n");
    let payload = Payload::new(&shell, &Smuggler);

    assert!(payload.can_run().is_empty());

    let err = payload.run("").unwrap_err();
    match err {
        PayloadError::UndeclaredPayload { payload, nested } => {
            assert_eq!(payload, "smuggler");
            assert_eq!(nested, "current_user");
        }
        other => panic!("expected UndeclaredPayload, got {:?}", other),
    }
    assert!(shell.calls().is_empty());
}

#[test]
fn test_payload_is_reusable() {
    let shell = RecordingShell::new([Operation::Execute]);
    let logic = Executable::default();
    let payload = Payload::new(&shell, &logic);

    for cmd in ["id", "uname -a", "hostname"] {
        assert_eq!(payload.run(cmd).unwrap(), cmd);
    }
    assert_eq!(logic.interactive_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_payloads_on_separate_shells() {
    let handles: Vec<_> = ["alice", "bob", "carol", "dave"]
        .into_iter()
        .map(|user| {
            tokio::task::spawn_blocking(move || {
                let shell = RecordingShell::new([Operation::Execute]).respond("whoami", user);
                let value = Payload::new(&shell, &CurrentUser).run_api("")?;
                Ok::<_, PayloadError>((user, value, shell.calls().len()))
            })
        })
        .collect();

    for handle in handles {
        let (user, value, calls) = handle.await.unwrap().unwrap();
        assert_eq!(value["user"], user);
        assert_eq!(calls, 1);
    }
}
