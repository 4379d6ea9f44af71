//! Name rewriting, temporary names and the built-in tables.

use crate::processor::token::Token;

/// C# reserved words that need an `@` prefix when used as identifiers.
const CSHARP_KEYWORDS: &[&str] = &[
    "abstract", "as", "base", "bool", "break", "byte", "case", "catch", "char", "checked",
    "class", "const", "continue", "decimal", "default", "delegate", "do", "double", "else",
    "enum", "event", "explicit", "extern", "false", "finally", "fixed", "float", "for",
    "foreach", "goto", "if", "implicit", "in", "int", "interface", "internal", "is", "lock",
    "long", "namespace", "new", "null", "object", "operator", "out", "override", "params",
    "private", "protected", "public", "readonly", "ref", "return", "sbyte", "sealed", "short",
    "sizeof", "stackalloc", "static", "string", "struct", "switch", "this", "throw", "true",
    "try", "typeof", "uint", "ulong", "unchecked", "unsafe", "ushort", "using", "virtual",
    "void", "volatile", "while",
];

/// VBScript built-in functions; emitted as `_.UPPERCASE(...)` calls.
const BUILT_IN_FUNCTIONS: &[&str] = &[
    "Abs", "Array", "Asc", "AscB", "AscW", "Atn", "CBool", "CByte", "CCur", "CDate", "CDbl",
    "Chr", "ChrB", "ChrW", "CInt", "CLng", "Cos", "CreateObject", "CSng", "CStr", "Date",
    "DateAdd", "DateDiff", "DatePart", "DateSerial", "DateValue", "Day", "Escape", "Eval", "Exp",
    "Filter", "Fix", "FormatCurrency", "FormatDateTime", "FormatNumber", "FormatPercent",
    "GetLocale", "GetObject", "GetRef", "Hex", "Hour", "InputBox", "InStr", "InStrB", "InStrRev",
    "Int", "IsArray", "IsDate", "IsEmpty", "IsNull", "IsNumeric", "IsObject", "Join", "LBound",
    "LCase", "Left", "LeftB", "Len", "LenB", "LoadPicture", "Log", "LTrim", "Mid", "MidB",
    "Minute", "Month", "MonthName", "MsgBox", "Now", "Oct", "Replace", "RGB", "Right", "RightB",
    "Rnd", "Round", "RTrim", "ScriptEngine", "ScriptEngineBuildVersion",
    "ScriptEngineMajorVersion", "ScriptEngineMinorVersion", "Second", "SetLocale", "Sgn", "Sin",
    "Space", "Split", "Sqr", "StrComp", "String", "StrReverse", "Tan", "Time", "Timer",
    "TimeSerial", "TimeValue", "Trim", "TypeName", "UBound", "UCase", "Unescape", "VarType",
    "Weekday", "WeekdayName", "Year",
];

/// VBScript built-in constants; emitted as `VBScriptConstants.<name>`.
const BUILT_IN_CONSTANTS: &[&str] = &[
    "vbCr", "vbCrLf", "vbFormFeed", "vbLf", "vbNewLine", "vbNullChar", "vbNullString", "vbTab",
    "vbVerticalTab", "vbObjectError", "vbBinaryCompare", "vbTextCompare", "vbDatabaseCompare",
    "vbSunday", "vbMonday", "vbTuesday", "vbWednesday", "vbThursday", "vbFriday", "vbSaturday",
    "vbUseSystemDayOfWeek", "vbFirstJan1", "vbFirstFourDays", "vbFirstFullWeek",
    "vbGeneralDate", "vbLongDate", "vbShortDate", "vbLongTime", "vbShortTime", "vbUseDefault",
    "vbTrue", "vbFalse", "vbEmpty", "vbNull", "vbInteger", "vbLong", "vbSingle", "vbDouble",
    "vbCurrency", "vbDate", "vbString", "vbObject", "vbError", "vbBoolean", "vbVariant",
    "vbDataObject", "vbDecimal", "vbByte", "vbArray", "vbOKOnly", "vbOKCancel",
    "vbAbortRetryIgnore", "vbYesNoCancel", "vbYesNo", "vbRetryCancel", "vbCritical",
    "vbQuestion", "vbExclamation", "vbInformation", "vbDefaultButton1", "vbDefaultButton2",
    "vbDefaultButton3", "vbDefaultButton4", "vbApplicationModal", "vbSystemModal", "vbOK",
    "vbCancel", "vbAbort", "vbRetry", "vbIgnore", "vbYes", "vbNo", "vbBlack", "vbRed",
    "vbGreen", "vbYellow", "vbBlue", "vbMagenta", "vbCyan", "vbWhite",
];

pub fn built_in_function(name: &str) -> Option<&'static str> {
    BUILT_IN_FUNCTIONS
        .iter()
        .find(|f| f.eq_ignore_ascii_case(name))
        .copied()
}

pub fn built_in_constant(name: &str) -> Option<&'static str> {
    BUILT_IN_CONSTANTS
        .iter()
        .find(|c| c.eq_ignore_ascii_case(name))
        .copied()
}

/// Case-insensitive key used for every scope lookup.
pub fn key(token: &Token) -> String {
    key_of(token.content())
}

pub fn key_of(name: &str) -> String {
    unescape(name).to_ascii_lowercase()
}

fn unescape(name: &str) -> &str {
    name.strip_prefix('[')
        .and_then(|n| n.strip_suffix(']'))
        .unwrap_or(name)
}

/// Rewrite a VBScript name as a legal, lower-case C# identifier.
pub fn rewrite(name: &str) -> String {
    let mut out: String = unescape(name)
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    if CSHARP_KEYWORDS.contains(&out.as_str()) {
        out.insert(0, '@');
    }
    out
}

pub fn rewrite_token(token: &Token) -> String {
    rewrite(token.content())
}

/// Hands out `retVal1`, `retVal2`, ... for one compilation. The capital
/// letter keeps them clear of rewritten names, which are all lower case.
#[derive(Debug, Default)]
pub struct TempValueNameGenerator {
    issued: usize,
}

impl TempValueNameGenerator {
    pub fn next(&mut self) -> String {
        self.issued += 1;
        format!("retVal{}", self.issued)
    }
}
