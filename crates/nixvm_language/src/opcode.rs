//! Instruction set for the Nixvm machine.
//!
//! The machine is stack-based. Most instructions consume operands from the
//! stack and push results back. Operands that are known when the program is
//! written (literals, jump targets, element types) travel inline as the
//! variant payload.

#![allow(clippy::doc_markdown)]

use std::fmt;

use nixvm_foundation::Type;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single instruction.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Opcode {
    // === Literals ===
    /// Push an integer: `[] -> [n]`
    Int(i64),
    /// Push a 32-bit float: `[] -> [x]`
    Float(f32),
    /// Push a 64-bit float: `[] -> [x]`
    Double(f64),
    /// Push a character: `[] -> [c]`
    Char(char),
    /// Allocate a string slot holding the text: `[] -> [ref]`
    Str(String),

    // === Stack ===
    /// Pop and discard the top of stack.
    Pop,
    /// Push a copy of the k-th value from the top (0 = top).
    Prev(usize),

    // === Arithmetic ===
    /// Add: `[a, b] -> [a + b]`
    Plus,
    /// Subtract: `[a, b] -> [a - b]`
    Minus,
    /// Multiply: `[a, b] -> [a * b]`
    Mul,
    /// Divide: `[a, b] -> [a / b]`
    Div,
    /// Remainder: `[a, b] -> [a % b]`
    Mod,

    // === Comparison and logic ===
    /// Equal: `[a, b] -> [a == b]`
    Eq,
    /// Not equal: `[a, b] -> [a != b]`
    Neq,
    /// Greater than: `[a, b] -> [a > b]`
    Gt,
    /// Less than: `[a, b] -> [a < b]`
    Lt,
    /// Greater than or equal: `[a, b] -> [a >= b]`
    Geq,
    /// Less than or equal: `[a, b] -> [a <= b]`
    Leq,
    /// Logical and of truthiness: `[a, b] -> [a && b]`
    And,
    /// Logical or of truthiness: `[a, b] -> [a || b]`
    Or,

    // === Conditionals ===
    /// Pop a condition; when false, resume after the next sibling boundary.
    If,
    /// Alternative branch header; its condition follows and ends at `Then`.
    Elif,
    /// Pop an `Elif` condition; when false, resume after the next boundary.
    Then,
    /// Fallback branch.
    Else,
    /// End of a conditional.
    EndIf,

    // === Loops ===
    /// Loop header. The condition instructions follow.
    While,
    /// Pop the loop condition; when false, resume after the matching `EndWhile`.
    RunWhile,
    /// Resume at the matching `While`.
    EndWhile,

    // === Output ===
    /// Pop and print a value.
    Print,
    /// Pop and print a value followed by a newline.
    Println,

    // === Jumps ===
    /// Continue at an absolute instruction index.
    Jump(usize),
    /// Stop the program.
    Halt,

    // === Variables ===
    /// Pop a value and declare a new variable holding it.
    Declare,
    /// Pop a value and store it in the most recently declared variable.
    Assign,
    /// Push the value of variable `i`.
    Load(usize),
    /// Pop a value and store it in variable `i`.
    Reassign(usize),

    // === Heap ===
    /// Allocate a buffer: `[count] -> [ref]`
    Alloc(Type),
    /// Release a buffer: `[ref] -> []`
    Free,
    /// Read an element: `[ref, index] -> [value]`
    PtrGet,
    /// Write an element: `[ref, index, value] -> []`
    PtrSet,

    // === Strings ===
    /// Concatenate two strings into a new slot: `[a, b] -> [ref]`
    Concat,

    // === Calls ===
    /// Start of a function body. Skipped in normal flow.
    FuncDef,
    /// Call the function defined at the given index.
    FuncCall(usize),
    /// Return to the caller.
    FuncRet,
    /// Start of a macro body. Skipped in normal flow.
    MacroDef,
    /// Return from a macro body.
    EndMacro,
    /// Expand the macro defined at the given index.
    MacroCall(usize),

    // === Services ===
    /// Delegate to the machine's service provider.
    Service(ServiceOp),
}

impl Opcode {
    /// Returns the listing mnemonic.
    #[must_use]
    pub const fn mnemonic(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Double(_) => "double",
            Self::Char(_) => "char",
            Self::Str(_) => "str",
            Self::Pop => "pop",
            Self::Prev(_) => "prev",
            Self::Plus => "plus",
            Self::Minus => "minus",
            Self::Mul => "mul",
            Self::Div => "div",
            Self::Mod => "mod",
            Self::Eq => "eq",
            Self::Neq => "neq",
            Self::Gt => "gt",
            Self::Lt => "lt",
            Self::Geq => "geq",
            Self::Leq => "leq",
            Self::And => "and",
            Self::Or => "or",
            Self::If => "if",
            Self::Elif => "elif",
            Self::Then => "then",
            Self::Else => "else",
            Self::EndIf => "endif",
            Self::While => "while",
            Self::RunWhile => "run_while",
            Self::EndWhile => "end_while",
            Self::Print => "print",
            Self::Println => "println",
            Self::Jump(_) => "jump",
            Self::Halt => "halt",
            Self::Declare => "declare",
            Self::Assign => "assign",
            Self::Load(_) => "load",
            Self::Reassign(_) => "reassign",
            Self::Alloc(_) => "alloc",
            Self::Free => "free",
            Self::PtrGet => "ptr_get",
            Self::PtrSet => "ptr_set",
            Self::Concat => "concat",
            Self::FuncDef => "func_def",
            Self::FuncCall(_) => "func_call",
            Self::FuncRet => "func_ret",
            Self::MacroDef => "macro_def",
            Self::EndMacro => "end_macro",
            Self::MacroCall(_) => "macro_call",
            Self::Service(op) => op.mnemonic(),
        }
    }

    /// Parses an instruction that takes no operand.
    #[must_use]
    pub fn nullary(mnemonic: &str) -> Option<Self> {
        Some(match mnemonic {
            "pop" => Self::Pop,
            "plus" => Self::Plus,
            "minus" => Self::Minus,
            "mul" => Self::Mul,
            "div" => Self::Div,
            "mod" => Self::Mod,
            "eq" => Self::Eq,
            "neq" => Self::Neq,
            "gt" => Self::Gt,
            "lt" => Self::Lt,
            "geq" => Self::Geq,
            "leq" => Self::Leq,
            "and" => Self::And,
            "or" => Self::Or,
            "if" => Self::If,
            "elif" => Self::Elif,
            "then" => Self::Then,
            "else" => Self::Else,
            "endif" => Self::EndIf,
            "while" => Self::While,
            "run_while" => Self::RunWhile,
            "end_while" => Self::EndWhile,
            "print" => Self::Print,
            "println" => Self::Println,
            "halt" => Self::Halt,
            "declare" => Self::Declare,
            "assign" => Self::Assign,
            "free" => Self::Free,
            "ptr_get" => Self::PtrGet,
            "ptr_set" => Self::PtrSet,
            "concat" => Self::Concat,
            "func_def" => Self::FuncDef,
            "func_ret" => Self::FuncRet,
            "macro_def" => Self::MacroDef,
            "end_macro" => Self::EndMacro,
            other => Self::Service(ServiceOp::from_mnemonic(other)?),
        })
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.mnemonic();
        match self {
            Self::Int(n) => write!(f, "{m} {n}"),
            Self::Float(x) => write!(f, "{m} {x:?}"),
            Self::Double(x) => write!(f, "{m} {x:?}"),
            Self::Char(c) => write!(f, "{m} '{}'", escape(&c.to_string(), '\'')),
            Self::Str(s) => write!(f, "{m} \"{}\"", escape(s, '"')),
            Self::Prev(n)
            | Self::Jump(n)
            | Self::Load(n)
            | Self::Reassign(n)
            | Self::FuncCall(n)
            | Self::MacroCall(n) => write!(f, "{m} {n}"),
            Self::Alloc(ty) => write!(f, "{m} {ty}"),
            _ => f.write_str(m),
        }
    }
}

fn escape(text: &str, quote: char) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\0' => out.push_str("\\0"),
            '\\' => out.push_str("\\\\"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out
}

/// Instructions the core accepts but delegates to a service provider.
///
/// None of these have semantics inside the machine itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[allow(missing_docs)]
pub enum ServiceOp {
    StructDef,
    StructInit,
    StructAccess,
    TableCreate,
    TableInsert,
    TableSelect,
    TableUpdate,
    TableDelete,
    SqlQuery,
    ChartPlot,
    ExportData,
    StatMean,
    StatMedian,
    StatMode,
    StatStdDev,
    Regression,
    Cluster,
    TimeSeries,
    ApiRequest,
    DbConnect,
    DbQuery,
    EtlExtract,
    EtlTransform,
    EtlLoad,
    DataValidate,
    ScriptExecute,
    JobSchedule,
    CustomAggregate,
    CustomTransform,
    ParallelExec,
    AsyncExec,
    AccessControl,
    EncryptData,
}

impl ServiceOp {
    /// Every service instruction, in listing order.
    pub const ALL: [ServiceOp; 33] = [
        Self::StructDef,
        Self::StructInit,
        Self::StructAccess,
        Self::TableCreate,
        Self::TableInsert,
        Self::TableSelect,
        Self::TableUpdate,
        Self::TableDelete,
        Self::SqlQuery,
        Self::ChartPlot,
        Self::ExportData,
        Self::StatMean,
        Self::StatMedian,
        Self::StatMode,
        Self::StatStdDev,
        Self::Regression,
        Self::Cluster,
        Self::TimeSeries,
        Self::ApiRequest,
        Self::DbConnect,
        Self::DbQuery,
        Self::EtlExtract,
        Self::EtlTransform,
        Self::EtlLoad,
        Self::DataValidate,
        Self::ScriptExecute,
        Self::JobSchedule,
        Self::CustomAggregate,
        Self::CustomTransform,
        Self::ParallelExec,
        Self::AsyncExec,
        Self::AccessControl,
        Self::EncryptData,
    ];

    /// Returns the listing mnemonic.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::StructDef => "struct_def",
            Self::StructInit => "struct_init",
            Self::StructAccess => "struct_access",
            Self::TableCreate => "table_create",
            Self::TableInsert => "table_insert",
            Self::TableSelect => "table_select",
            Self::TableUpdate => "table_update",
            Self::TableDelete => "table_delete",
            Self::SqlQuery => "sql_query",
            Self::ChartPlot => "chart_plot",
            Self::ExportData => "export_data",
            Self::StatMean => "stat_mean",
            Self::StatMedian => "stat_median",
            Self::StatMode => "stat_mode",
            Self::StatStdDev => "stat_std_dev",
            Self::Regression => "regression",
            Self::Cluster => "cluster",
            Self::TimeSeries => "time_series",
            Self::ApiRequest => "api_request",
            Self::DbConnect => "db_connect",
            Self::DbQuery => "db_query",
            Self::EtlExtract => "etl_extract",
            Self::EtlTransform => "etl_transform",
            Self::EtlLoad => "etl_load",
            Self::DataValidate => "data_validate",
            Self::ScriptExecute => "script_execute",
            Self::JobSchedule => "job_schedule",
            Self::CustomAggregate => "custom_aggregate",
            Self::CustomTransform => "custom_transform",
            Self::ParallelExec => "parallel_exec",
            Self::AsyncExec => "async_exec",
            Self::AccessControl => "access_control",
            Self::EncryptData => "encrypt_data",
        }
    }

    /// Parses a service instruction from its mnemonic.
    #[must_use]
    pub fn from_mnemonic(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.mnemonic() == name)
    }
}

impl fmt::Display for ServiceOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// An immutable-once-built sequence of instructions.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Program {
    /// The instructions.
    pub ops: Vec<Opcode>,
}

impl Program {
    /// Creates an empty program.
    #[must_use]
    pub fn new() -> Self {
        Self { ops: Vec::new() }
    }

    /// Adds an instruction and returns its index.
    pub fn emit(&mut self, op: Opcode) -> usize {
        let idx = self.ops.len();
        self.ops.push(op);
        idx
    }

    /// Returns the instruction count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Returns true if there are no instructions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Returns the instruction at `ip`.
    #[must_use]
    pub fn get(&self, ip: usize) -> Option<&Opcode> {
        self.ops.get(ip)
    }

    /// Renders the program in listing form, one instruction per line.
    #[must_use]
    pub fn disassemble(&self) -> String {
        let mut out = String::new();
        for op in &self.ops {
            out.push_str(&op.to_string());
            out.push('\n');
        }
        out
    }
}

impl From<Vec<Opcode>> for Program {
    fn from(ops: Vec<Opcode>) -> Self {
        Self { ops }
    }
}

impl FromIterator<Opcode> for Program {
    fn from_iter<I: IntoIterator<Item = Opcode>>(iter: I) -> Self {
        Self {
            ops: iter.into_iter().collect(),
        }
    }
}
