//! Integration tests for the listing assembler

use nixvm_foundation::{ErrorKind, Type};
use nixvm_language::{Lexer, Opcode, Program, ServiceOp, TokenKind, assemble, assemble_strict};

#[test]
fn assemble_every_operand_form() {
    let source = r#"
; literals
int -7
float 0.5
double 1e3
char 'q'
str "two words"
alloc char
prev 1
load 0
reassign 2
"#;
    let program = assemble(source).unwrap();
    assert_eq!(
        program.ops,
        vec![
            Opcode::Int(-7),
            Opcode::Float(0.5),
            Opcode::Double(1000.0),
            Opcode::Char('q'),
            Opcode::Str("two words".into()),
            Opcode::Alloc(Type::Char),
            Opcode::Prev(1),
            Opcode::Load(0),
            Opcode::Reassign(2),
        ]
    );
}

#[test]
fn every_service_mnemonic_assembles() {
    let listing: String = ServiceOp::ALL
        .iter()
        .map(|op| format!("{op}\n"))
        .collect();
    let program = assemble(&listing).unwrap();
    let expected: Vec<Opcode> = ServiceOp::ALL.iter().copied().map(Opcode::Service).collect();
    assert_eq!(program.ops, expected);
}

#[test]
fn labels_name_the_next_instruction() {
    let source = "
  jump start
square:
  func_def
  prev 0
  mul
  func_ret
start:
  int 7
  func_call square
  println
";
    let program = assemble_strict(source).unwrap();
    assert_eq!(program.ops[0], Opcode::Jump(5));
    assert_eq!(program.ops[6], Opcode::FuncCall(1));
}

#[test]
fn errors_carry_line_and_column() {
    let err = assemble("int 1\nint 2\n   plus 3\n").unwrap_err();
    match err.kind {
        ErrorKind::ParseError { line, column, .. } => assert_eq!((line, column), (3, 9)),
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn lexer_errors_surface_as_parse_errors() {
    let err = assemble("str \"unterminated\n").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::ParseError { .. }));
    assert!(err.to_string().contains("unterminated"));
}

#[test]
fn strict_assembly_rejects_bad_targets() {
    let err = assemble_strict("jump 9\n").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::InvalidJump(_)));
    let err = assemble_strict("int 1\nfunc_call 0\n").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::InvalidJump(_)));
}

#[test]
fn disassembly_is_listing_text() {
    let program = Program::from(vec![
        Opcode::Char('\t'),
        Opcode::Str("say \"hi\"\n".into()),
        Opcode::Double(-0.125),
        Opcode::Service(ServiceOp::ChartPlot),
    ]);
    let listing = program.disassemble();
    assert!(listing.contains("chart_plot"));
    assert_eq!(assemble(&listing).unwrap(), program);
}

#[test]
fn lexer_is_line_oriented() {
    let kinds: Vec<TokenKind> = Lexer::tokenize_all("a:\n b 1")
        .into_iter()
        .map(|t| t.kind)
        .collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::Label("a".into()),
            TokenKind::Newline,
            TokenKind::Word("b".into()),
            TokenKind::Number("1".into()),
            TokenKind::Eof,
        ]
    );
}
