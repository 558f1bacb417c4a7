/// 远端命令行, `shell:` 与 `log:` 共用。
///
/// 多个参数按空格拼接, 与 adb 命令行的行为一致 (不做引号转义)。
#[derive(Ord, PartialOrd, Eq, PartialEq, Debug, Clone)]
pub enum AdbCommand<'a> {
    Slice(&'a [&'a str]),
    String(&'a str),
    Owned(Vec<String>),
}

impl<'a> AdbCommand<'a> {
    pub fn get_command(&self) -> String {
        match self {
            AdbCommand::Slice(s) => s.join(" "),
            AdbCommand::String(s) => s.to_string(),
            AdbCommand::Owned(s) => s.join(" "),
        }
    }
}

impl<'a> From<&'a str> for AdbCommand<'a> {
    fn from(value: &'a str) -> Self {
        AdbCommand::String(value)
    }
}

impl<'a> From<&'a [&'a str]> for AdbCommand<'a> {
    fn from(value: &'a [&'a str]) -> Self {
        AdbCommand::Slice(value)
    }
}

impl<'a, const N: usize> From<&'a [&'a str; N]> for AdbCommand<'a> {
    fn from(value: &'a [&'a str; N]) -> Self {
        AdbCommand::Slice(value)
    }
}

impl<'a> From<&'a Vec<&'a str>> for AdbCommand<'a> {
    fn from(value: &'a Vec<&'a str>) -> Self {
        AdbCommand::Slice(value)
    }
}

impl From<Vec<String>> for AdbCommand<'_> {
    fn from(value: Vec<String>) -> Self {
        AdbCommand::Owned(value)
    }
}

impl From<String> for AdbCommand<'_> {
    fn from(value: String) -> Self {
        AdbCommand::Owned(vec![value])
    }
}

#[test]
fn test_into() {
    let a = "a";
    let b = ["a", "b", "c"];
    let c = vec![a, "b", "c"];
    assert_eq!(AdbCommand::String(a), a.into());
    assert_eq!(AdbCommand::Slice(&b), (&b).into());
    assert_eq!(AdbCommand::Slice(&c), (&c).into());
    assert_eq!(
        AdbCommand::from(vec!["getprop".to_string(), "ro.product.model".to_string()])
            .get_command(),
        "getprop ro.product.model"
    );
}

#[test]
fn test_slice_joins_with_space() {
    let args = ["logcat", "-v", "time"];
    assert_eq!(AdbCommand::from(&args).get_command(), "logcat -v time");
}
