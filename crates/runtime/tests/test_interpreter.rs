//! End-to-end interpreter tests: whole programs through the pipeline
//! with a scripted model client.

use std::rc::Rc;

use aua_core::AuaError;
use aua_runtime::{ScriptedClient, Value, run_with_client};

fn run(source: &str) -> Result<Value, AuaError> {
    run_with_client(source, Rc::new(ScriptedClient::new()))
}

fn eval(source: &str) -> Value {
    run(source).unwrap()
}

#[test]
fn test_arithmetic_program() {
    assert_eq!(eval("x = 5; y = x + 2; y * 3"), Value::Int(21));
}

#[test]
fn test_ternary_conditional() {
    assert_eq!(eval("if false then 1 else 2"), Value::Int(2));
}

#[test]
fn test_while_loop_counts() {
    assert_eq!(
        eval("counter = 0; while counter < 3 counter = counter + 1 end; counter"),
        Value::Int(3)
    );
}

#[test]
fn test_recursive_factorial() {
    assert_eq!(
        eval("fun fact(n) if n <= 1 then 1 else n * fact(n - 1) end end; fact(5)"),
        Value::Int(120)
    );
}

#[test]
fn test_object_literal_field_arithmetic() {
    assert_eq!(
        eval("type Point = { x: Int, y: Int }; p = { x: 3, y: 4 }; p.x + p.y"),
        Value::Int(7)
    );
}

#[test]
fn test_integer_literal_round_trip() {
    for n in [0i64, 1, -1, 42, 1_000_000, i64::MAX] {
        assert_eq!(eval(&n.to_string()), Value::Int(n));
    }
}

#[test]
fn test_float_literal_round_trip() {
    assert_eq!(eval("3.14"), Value::Float(3.14));
    assert_eq!(eval("0.5"), Value::Float(0.5));
}

#[test]
fn test_empty_string_literal_and_equality() {
    assert_eq!(eval("\"\""), Value::Str(String::new()));
    assert_eq!(eval("\"\" == \"\""), Value::Bool(true));
}

#[test]
fn test_deeply_nested_parens() {
    assert_eq!(eval("x = 7\n((((x))))"), Value::Int(7));
}

#[test]
fn test_power_boundary_cases() {
    assert_eq!(eval("a = 1\na ** 0"), Value::Int(1));
    assert_eq!(eval("b = 0\nb ** 0"), Value::Int(1));
}

#[test]
fn test_division_by_zero_is_value_error() {
    assert!(matches!(run("1 / 0").unwrap_err(), AuaError::Value(_)));
}

#[test]
fn test_truthiness_in_conditionals() {
    assert_eq!(eval("if 0 then 'y' else 'n'"), Value::Str("n".to_string()));
    assert_eq!(eval("if '' then 'y' else 'n'"), Value::Str("n".to_string()));
    assert_eq!(
        eval("if nihil then 'y' else 'n'"),
        Value::Str("n".to_string())
    );
    assert_eq!(eval("if 7 then 'y' else 'n'"), Value::Str("y".to_string()));
    assert_eq!(
        eval("if 'text' then 'y' else 'n'"),
        Value::Str("y".to_string())
    );
}

#[test]
fn test_elif_chain() {
    let source = "x = 2\nif x == 1\n'one'\nelif x == 2\n'two'\nelse\n'many'\nend";
    assert_eq!(eval(source), Value::Str("two".to_string()));
}

#[test]
fn test_string_interpolation() {
    assert_eq!(
        eval("name = 'aua'\n\"hello ${name}!\""),
        Value::Str("hello aua!".to_string())
    );
}

#[test]
fn test_interpolation_coerces_non_strings() {
    assert_eq!(
        eval("n = 6\n\"${n} of one, half a dozen of the other\""),
        Value::Str("6 of one, half a dozen of the other".to_string())
    );
}

#[test]
fn test_lexical_scoping_resolves_definition_environment() {
    // get_x closes over the global frame; wrapper's parameter must not
    // shadow it.
    let source = "x = 1\nfun get_x() x end\nfun wrapper(x) get_x() end\nwrapper(99)";
    assert_eq!(eval(source), Value::Int(1));
}

#[test]
fn test_assignment_updates_enclosing_binding() {
    let source = "total = 0\nfun bump() total = total + 1 end\nbump()\nbump()\ntotal";
    assert_eq!(eval(source), Value::Int(2));
}

#[test]
fn test_function_arity_mismatch_is_arity_error() {
    assert!(matches!(
        run("fun f(a) a end\nf(1, 2)").unwrap_err(),
        AuaError::Arity(_)
    ));
}

#[test]
fn test_unknown_call_is_name_error() {
    assert!(matches!(run("mystery(1)").unwrap_err(), AuaError::Name(_)));
}

#[test]
fn test_logical_operators_short_circuit() {
    // The right operands would be name errors if evaluated.
    assert_eq!(eval("false && boom"), Value::Bool(false));
    assert_eq!(eval("true || boom"), Value::Bool(true));
    assert_eq!(eval("true && true"), Value::Bool(true));
    assert_eq!(eval("false || false"), Value::Bool(false));
}

#[test]
fn test_comparison_chain_results() {
    assert_eq!(eval("1 < 2"), Value::Bool(true));
    assert_eq!(eval("2 <= 2"), Value::Bool(true));
    assert_eq!(eval("'abc' < 'abd'"), Value::Bool(true));
    assert_eq!(eval("3 != 4"), Value::Bool(true));
}

#[test]
fn test_list_literals_and_size() {
    assert_eq!(
        eval("xs = [1, 2, 3]\nsize xs"),
        Value::Int(3)
    );
}

#[test]
fn test_member_assignment_on_object() {
    assert_eq!(eval("p = { x: 1, y: 2 }\np.x = 10\np.x + p.y"), Value::Int(12));
}

#[test]
fn test_command_call_with_expression_argument() {
    assert_eq!(eval("fun double(n) n * 2 end\ndouble 21"), Value::Int(42));
}

#[test]
fn test_negation_and_not() {
    assert_eq!(eval("x = 5\n-x"), Value::Int(-5));
    assert_eq!(eval("!true"), Value::Bool(false));
    assert_eq!(eval("!0"), Value::Bool(true));
}

#[test]
fn test_mixed_numeric_operands_are_type_error() {
    assert!(matches!(
        run("x = 1\nx + 2.5").unwrap_err(),
        AuaError::Type(_)
    ));
}

#[test]
fn test_program_value_is_last_statement() {
    assert_eq!(eval("1\n2\n3"), Value::Int(3));
}

#[test]
fn test_empty_program_is_nihil() {
    assert_eq!(eval(""), Value::Nihil);
    assert_eq!(eval("# only a comment"), Value::Nihil);
}
