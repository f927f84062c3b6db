mod common;

use common::{analyze, int, trace_pairs};
use pretty_assertions::assert_eq;
use scopetrace::{
    AnalysisError, BindingEvent, BindingTrace, EmptyStackError, Module, ScopeAnalyzer, Value,
    parse,
};

#[test]
fn literal_propagates_through_names() {
    let analysis = analyze("y = 5\nz = y\n");
    assert_eq!(analysis.scope.resolve("y"), Some(Value::Int(5)));
    assert_eq!(analysis.scope.resolve("z"), Some(Value::Int(5)));
    assert_eq!(
        trace_pairs(&analysis),
        vec![("y".to_string(), int(5)), ("z".to_string(), int(5))]
    );
    assert_eq!(analysis.error, None);
}

#[test]
fn function_parameters_without_assignments() {
    let analysis = analyze("def f(a, b):\n    return a + b\n");
    assert_eq!(analysis.scope.get("a"), Some(&None));
    assert_eq!(analysis.scope.get("b"), Some(&None));
    assert!(analysis.trace.is_empty());
}

#[test]
fn every_parameter_kind_is_bound() {
    let analysis = analyze("def f(a, /, b=2, *args, c, **kw):\n    pass\n");
    let mut names: Vec<_> = analysis.scope.iter().map(|(name, _)| name).collect();
    names.sort_unstable();
    assert_eq!(names, ["a", "args", "b", "c", "kw"]);
    assert!(analysis.scope.iter().all(|(_, value)| value.is_none()));
}

#[test]
fn parameter_can_be_rebound_in_body() {
    let analysis = analyze("def f(a):\n    a = 'x'\n    b = a\n");
    assert_eq!(analysis.scope.resolve("a"), Some(Value::Str("x".to_string())));
    assert_eq!(analysis.scope.resolve("b"), Some(Value::Str("x".to_string())));
}

#[test]
fn assignments_inside_compound_statements_are_traced() {
    let source = "\
if cond:
    a = 1
else:
    a = 2
for i in range(3):
    b = a
class K:
    c = 'k'
";
    let analysis = analyze(source);
    let names: Vec<_> = analysis.trace.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["a", "a", "b", "c"]);
    assert_eq!(analysis.scope.resolve("b"), Some(Value::Int(2)));
    assert!(!analysis.scope.contains("i"));
}

#[test]
fn unresolvable_values() {
    let analysis = analyze("a = f()\nb = 1 + 2\nc = -5\nd = missing\n");
    for name in ["a", "b", "c", "d"] {
        assert_eq!(analysis.scope.get(name), Some(&None), "{name}");
    }
    assert_eq!(analysis.trace.len(), 4);
}

#[test]
fn literal_kinds() {
    let analysis = analyze("a = 1.5\nb = b'x'\nc = None\nd = False\ne = 2j\n");
    assert_eq!(analysis.scope.resolve("a"), Some(Value::Float(1.5)));
    assert_eq!(analysis.scope.resolve("b"), Some(Value::Bytes(b"x".to_vec())));
    assert_eq!(analysis.scope.get("c"), Some(&Some(Value::None)));
    assert_eq!(analysis.scope.resolve("d"), Some(Value::Bool(false)));
    assert_eq!(analysis.scope.resolve("e"), Some(Value::Complex(2.0)));
}

#[test]
fn chained_targets_record_one_event_each() {
    let analysis = analyze("a = b = 7\n");
    assert_eq!(
        trace_pairs(&analysis),
        vec![("a".to_string(), int(7)), ("b".to_string(), int(7))]
    );
}

#[test]
fn unpacking_and_attribute_targets_are_skipped() {
    let analysis = analyze("x, y = 1, 2\nobj.attr = 3\nitems[0] = 4\n");
    assert!(analysis.scope.is_empty());
    assert!(analysis.trace.is_empty());
}

#[test]
fn walrus_and_augmented_assignment_do_not_bind() {
    let analysis = analyze("if (n := 10) > 5:\n    pass\ncount = 0\ncount += 1\n");
    assert!(!analysis.scope.contains("n"));
    assert_eq!(analysis.scope.resolve("count"), Some(Value::Int(0)));
    assert_eq!(analysis.trace.len(), 1);
}

#[test]
fn trace_pops_newest_first() {
    let mut analysis = analyze("a = 1\nb = 2\n");
    assert_eq!(analysis.trace.pop(), Ok(BindingEvent::new("b", int(2))));
    assert_eq!(analysis.trace.pop(), Ok(BindingEvent::new("a", int(1))));
    assert_eq!(analysis.trace.pop(), Err(EmptyStackError));
}

#[test]
fn depth_limit_stops_analysis_but_keeps_prior_bindings() {
    let sum = ["1"; 50].join(" + ");
    let source = format!("first = 1\ntotal = {sum}\n");
    let module = parse(&source).expect("parses");

    let mut analyzer = ScopeAnalyzer::new(BindingTrace::new()).with_max_depth(20);
    let err = analyzer.analyze(&module);
    assert_eq!(err, Some(AnalysisError::RecursionLimit { depth: 20 }));
    assert_eq!(analyzer.scope().resolve("first"), Some(Value::Int(1)));
    assert!(!analyzer.scope().contains("total"));

    let mut analyzer = ScopeAnalyzer::default();
    assert_eq!(analyzer.analyze(&module), None);
    assert_eq!(analyzer.scope().get("total"), Some(&None));
}

#[test]
fn analyzer_is_reusable_over_modules() {
    let mut analyzer = ScopeAnalyzer::default();
    assert_eq!(analyzer.analyze(&Module::new().assign("a", scopetrace::Expr::int(1))), None);
    assert_eq!(analyzer.analyze(&Module::new().assign("b", scopetrace::Expr::name("a"))), None);
    assert_eq!(analyzer.scope().resolve("b"), Some(Value::Int(1)));
    assert_eq!(analyzer.trace().len(), 2);
}
