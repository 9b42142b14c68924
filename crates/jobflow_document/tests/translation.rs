//! Integration tests for translating workflows into documents.

mod test_utils;

use hashbrown::HashSet;
use jobflow_dag::prelude::*;
use jobflow_document::prelude::*;
use jobflow_document::{DEFAULT_KILL_MESSAGE, serialize};
use jobflow_graph::GraphError;
use proptest::prelude::*;
use test_utils::{
    Notify, NotifyBuilder, arb_layered_dag, email_handler, known_names, otherwise, position, shell,
    shell_with_handler, transition_targets, translate, when, workflow_of,
};

// ═══════════════════════════════════════════════════════════════════════════════
// STRUCTURE
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn linear_chain_links_actions_in_order() {
    let mut dag = Dag::new();
    let a = shell(&mut dag, "a", &[]);
    shell(&mut dag, "b", &[a]);

    let document = translate(&dag).unwrap();

    assert_eq!(document.name, "wf");
    assert_eq!(document.start.to, "a");
    assert_eq!(document.action("a").unwrap().ok, "b");
    assert_eq!(document.action("b").unwrap().ok, "end");
    assert_eq!(document.end.name, "end");
}

#[test]
fn fan_out_becomes_fork_and_join() {
    let mut dag = Dag::new();
    let a = shell(&mut dag, "A", &[]);
    shell(&mut dag, "B", &[a]);
    shell(&mut dag, "C", &[a]);

    let document = translate(&dag).unwrap();

    assert_eq!(document.action("A").unwrap().ok, "fork_1");
    let Some(Element::Fork(fork)) = document.element("fork_1") else {
        panic!("expected a fork");
    };
    let starts: Vec<&str> = fork.paths.iter().map(|path| path.start.as_str()).collect();
    assert_eq!(starts, ["B", "C"]);

    assert_eq!(document.action("B").unwrap().ok, "join_1");
    assert_eq!(document.action("C").unwrap().ok, "join_1");
    let Some(Element::Join(join)) = document.element("join_1") else {
        panic!("expected a join");
    };
    assert_eq!(join.to, "end");
}

#[test]
fn reconverging_branches_join_before_the_merge_node() {
    let mut dag = Dag::new();
    let a = shell(&mut dag, "A", &[]);
    let b = shell(&mut dag, "B", &[a]);
    let c = shell(&mut dag, "C", &[a]);
    shell(&mut dag, "D", &[b, c]);

    let document = translate(&dag).unwrap();

    let Some(Element::Join(join)) = document.element("join_1") else {
        panic!("expected a join");
    };
    assert_eq!(join.to, "D");
    assert_eq!(document.action("D").unwrap().ok, "end");
}

#[test]
fn conditional_children_become_a_decision() {
    let mut dag = Dag::new();
    let a = shell(&mut dag, "A", &[]);
    when(&mut dag, "B", a, "${x}");
    otherwise(&mut dag, "C", a);

    let document = translate(&dag).unwrap();

    assert_eq!(document.action("A").unwrap().ok, "decision_1");
    let Some(Element::Decision(decision)) = document.element("decision_1") else {
        panic!("expected a decision");
    };
    assert_eq!(decision.switch.cases.len(), 1);
    assert_eq!(decision.switch.cases[0].to, "B");
    assert_eq!(decision.switch.cases[0].condition, "${x}");
    assert_eq!(decision.switch.default.to, "C");

    assert!(document.element("decision_join_1").is_none());
    assert_eq!(document.action("B").unwrap().ok, "end");
    assert_eq!(document.action("C").unwrap().ok, "end");
}

#[test]
fn decision_without_default_fails() {
    let mut dag = Dag::new();
    let a = shell(&mut dag, "A", &[]);
    when(&mut dag, "B", a, "${x}");

    assert!(matches!(
        translate(&dag),
        Err(DocumentError::Graph(GraphError::MissingDefault { ref node })) if node == "A"
    ));
}

#[test]
fn unstructured_workflow_fails() {
    let mut dag = Dag::new();
    let a = shell(&mut dag, "a", &[]);
    let b = shell(&mut dag, "b", &[a]);
    let c = shell(&mut dag, "c", &[a]);
    shell(&mut dag, "d", &[b, c]);
    shell(&mut dag, "e", &[c]);

    assert!(matches!(
        translate(&dag),
        Err(DocumentError::Graph(GraphError::UnstructuredBranch { .. }))
    ));
}

// ═══════════════════════════════════════════════════════════════════════════════
// KILL AND ERROR HANDLERS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn document_has_exactly_one_kill() {
    let mut dag = Dag::new();
    let a = shell(&mut dag, "a", &[]);
    shell(&mut dag, "b", &[a]);
    shell(&mut dag, "c", &[a]);

    let document = translate(&dag).unwrap();

    let kills: Vec<&KillElement> = document.kills().collect();
    assert_eq!(kills.len(), 1);
    assert_eq!(kills[0].name, "kill");
    assert_eq!(kills[0].message, DEFAULT_KILL_MESSAGE);
}

#[test]
fn kill_message_is_configurable() {
    let mut dag = Dag::new();
    shell(&mut dag, "a", &[]);

    let translator =
        Translator::new().with_config(TranslatorConfig::new().with_kill_message("job failed"));
    let document = translator.translate(&workflow_of(&dag)).unwrap();

    assert_eq!(document.kills().next().unwrap().message, "job failed");
}

#[test]
fn action_without_handler_fails_to_kill() {
    let mut dag = Dag::new();
    shell(&mut dag, "a", &[]);

    let document = translate(&dag).unwrap();

    assert_eq!(document.action("a").unwrap().error, "kill");
}

#[test]
fn handler_receives_error_transition_and_fails_to_kill() {
    let handler = email_handler("H");
    let mut dag = Dag::new();
    shell_with_handler(&mut dag, "a", &[], Some(&handler));

    let document = translate(&dag).unwrap();

    assert_eq!(document.action("a").unwrap().error, "H");
    let emitted = document.action("H").unwrap();
    assert_eq!(emitted.ok, "kill");
    assert_eq!(emitted.error, "kill");
    assert_eq!(emitted.payload.kind(), "email");
    assert!(position(&document, "H") < position(&document, "a"));
}

#[test]
fn shared_handler_is_emitted_once() {
    let handler = email_handler("H");
    let mut dag = Dag::new();
    let a = shell_with_handler(&mut dag, "a", &[], Some(&handler));
    shell_with_handler(&mut dag, "b", &[a], Some(&handler));

    let document = translate(&dag).unwrap();

    let count = document.actions().filter(|action| action.name == "H").count();
    assert_eq!(count, 1);
    assert_eq!(document.action("b").unwrap().error, "H");
}

#[test]
fn distinct_handlers_with_one_name_collide() {
    let mut dag = Dag::new();
    let a = shell_with_handler(&mut dag, "a", &[], Some(&email_handler("H")));
    shell_with_handler(&mut dag, "b", &[a], Some(&email_handler("H")));

    assert!(matches!(
        translate(&dag),
        Err(DocumentError::DuplicateElementName { ref name }) if name == "H"
    ));
}

#[test]
fn handler_named_like_a_node_collides() {
    let handler = email_handler("b");
    let mut dag = Dag::new();
    let a = shell(&mut dag, "a", &[]);
    shell_with_handler(&mut dag, "b", &[a], Some(&handler));

    assert!(matches!(
        translate(&dag),
        Err(DocumentError::DuplicateElementName { ref name }) if name == "b"
    ));
}

#[test]
fn handler_named_like_a_structural_node_is_kept() {
    let handler = email_handler("join_1");
    let mut dag = Dag::new();
    let a = shell_with_handler(&mut dag, "a", &[], Some(&handler));
    shell(&mut dag, "b", &[a]);
    shell(&mut dag, "c", &[a]);

    let document = translate(&dag).unwrap();

    assert_eq!(document.action("a").unwrap().error, "join_1");
    assert!(document.action("join_1").is_some());
    assert!(matches!(document.element("join_2"), Some(Element::Join(_))));
}

// ═══════════════════════════════════════════════════════════════════════════════
// ACTION KINDS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn every_builtin_kind_is_translated() {
    let mut dag = Dag::new();

    let mut map_reduce = MapReduceActionBuilder::new();
    map_reduce
        .with_name("mr")
        .unwrap()
        .with_job_tracker("jt:8032")
        .unwrap();
    let mr = map_reduce.build(&mut dag).unwrap();

    let mut fs = FsActionBuilder::new();
    fs.with_name("fs").unwrap().with_parent(mr).unwrap();
    fs.with_mkdir("/tmp/out");
    let fs = fs.build(&mut dag).unwrap();

    let mut sub = SubWorkflowActionBuilder::new();
    sub.with_name("sub")
        .unwrap()
        .with_parent(fs)
        .unwrap()
        .with_app_path("/apps/child")
        .unwrap();
    let sub = sub.build(&mut dag).unwrap();

    let mut email = EmailActionBuilder::new();
    email.with_name("mail").unwrap().with_parent(sub).unwrap();
    email.with_recipient("ops@example.com");
    let mail = email.build(&mut dag).unwrap();

    shell(&mut dag, "sh", &[mail]);

    let document = translate(&dag).unwrap();

    let kinds: Vec<&str> = document
        .actions()
        .map(|action| action.payload.kind())
        .collect();
    assert_eq!(kinds, ["map-reduce", "fs", "sub-workflow", "email", "shell"]);

    let ActionPayload::MapReduce(payload) = &document.action("mr").unwrap().payload else {
        panic!("expected a map-reduce payload");
    };
    assert_eq!(payload.job_tracker.as_deref(), Some("jt:8032"));
    let ActionPayload::SubWorkflow(payload) = &document.action("sub").unwrap().payload else {
        panic!("expected a sub-workflow payload");
    };
    assert_eq!(payload.app_path.as_deref(), Some("/apps/child"));
}

#[test]
fn unregistered_kind_fails() {
    let mut dag = Dag::new();
    let mut builder = NotifyBuilder::default();
    builder.with_name("notify").unwrap();
    builder.build(&mut dag).unwrap();

    assert!(matches!(
        translate(&dag),
        Err(DocumentError::UnrecognizedActionKind { kind: "notify", .. })
    ));
}

#[test]
fn registered_custom_kind_is_translated() {
    let mut dag = Dag::new();
    let mut builder = NotifyBuilder::new("#ops");
    builder.with_name("notify").unwrap();
    builder.build(&mut dag).unwrap();

    let mut translator = Translator::new();
    translator.mappings_mut().register_serialized::<Notify>();
    let document = translator.translate(&workflow_of(&dag)).unwrap();

    assert_eq!(
        document.action("notify").unwrap().payload,
        ActionPayload::Other {
            kind: "notify".to_string(),
            body: serde_json::json!({ "channel": "#ops" }),
        }
    );
}

// ═══════════════════════════════════════════════════════════════════════════════
// WORKFLOW DECLARATIONS AND JSON
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn workflow_declarations_are_carried_over() {
    let mut dag = Dag::new();
    let a = shell(&mut dag, "a", &[]);

    let mut builder = WorkflowBuilder::new();
    builder
        .with_name("wf")
        .unwrap()
        .with_dag_containing_node(a)
        .with_parameter("queue", "default")
        .with_credential(Credential::new("hive", "hcat").with_property("uri", "thrift://hive"));
    builder
        .with_global(Global::new().with_job_tracker("jt:8032"))
        .unwrap();
    let workflow = builder.build(&dag).unwrap();

    let document = Translator::new().translate(&workflow).unwrap();

    assert_eq!(document.parameters, workflow.parameters());
    assert_eq!(document.global.as_ref(), workflow.global());
    assert_eq!(document.credentials, workflow.credentials());
}

#[test]
fn serialized_document_is_valid_json() {
    let mut dag = Dag::new();
    let a = shell(&mut dag, "a", &[]);
    when(&mut dag, "b", a, "${x}");
    otherwise(&mut dag, "c", a);

    let json = serialize(&workflow_of(&dag)).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["name"], "wf");
    assert_eq!(value["start"]["to"], "a");
    assert_eq!(value["end"]["name"], "end");
    assert_eq!(value["elements"][0]["type"], "kill");
    assert_eq!(value["elements"][1]["type"], "action");
    assert_eq!(value["elements"][1]["shell"]["exec"], "a.sh");
    assert_eq!(value["elements"][2]["type"], "decision");
    assert!(value.get("parameters").is_none());
}

// ═══════════════════════════════════════════════════════════════════════════════
// PROPERTIES
// ═══════════════════════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Every transition names an element or the end, element names are
    /// unique, and there is exactly one kill.
    #[test]
    fn transitions_are_closed(layered in arb_layered_dag()) {
        let handlers: Vec<ErrorHandler> =
            (0..3).map(|index| email_handler(&format!("h{index}"))).collect();
        let dag = layered.build(&handlers);
        let document = translate(&dag).unwrap();

        let names = known_names(&document);
        for target in transition_targets(&document) {
            prop_assert!(names.contains(&target), "dangling target {}", target);
        }

        let unique: HashSet<&str> = document.elements.iter().map(Element::name).collect();
        prop_assert_eq!(unique.len(), document.elements.len());
        prop_assert_eq!(document.kills().count(), 1);
    }

    /// Each action is emitted once per node, plus once per handler in use.
    #[test]
    fn one_action_per_node_and_handler(layered in arb_layered_dag()) {
        let handlers: Vec<ErrorHandler> =
            (0..3).map(|index| email_handler(&format!("h{index}"))).collect();
        let dag = layered.build(&handlers);
        let document = translate(&dag).unwrap();

        let used: HashSet<usize> = layered.handlers.iter().flatten().map(|h| h % 3).collect();
        prop_assert_eq!(document.actions().count(), layered.node_count() + used.len());

        for action in document.actions() {
            if action.name.starts_with('h') {
                prop_assert_eq!(action.ok.as_str(), "kill");
                prop_assert_eq!(action.error.as_str(), "kill");
            }
        }
    }
}
