//! # Command 模块
//!
//! 舞台的文本命令（从标准输入逐行读取）。

use thiserror::Error;

use crate::element::ElementAttributes;

/// 舞台命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageCommand {
    /// 打开幕布（不指定标识时打开全部）
    Open(Option<String>),
    /// 重置幕布（不指定标识时重置全部）
    Reset(Option<String>),
    /// 重新安排自动开幕（不指定标识时作用于全部）
    Rearm(Option<String>),
    /// 设置元素属性
    Set { name: String, value: String },
    /// 移除元素属性
    Unset { name: String },
    /// 打印状态
    Status,
    /// 退出
    Quit,
}

/// 命令解析错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// 空行
    #[error("空命令")]
    Empty,
    /// 未知命令
    #[error("未知命令: {0}")]
    Unknown(String),
    /// 缺少参数
    #[error("命令 {command} 缺少参数 <{argument}>")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },
}

impl StageCommand {
    /// 解析一行命令
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let line = line.trim();
        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };
        let target = (!rest.is_empty()).then(|| rest.to_string());

        match head {
            "" => Err(CommandError::Empty),
            "open" => Ok(Self::Open(target)),
            "reset" => Ok(Self::Reset(target)),
            "rearm" => Ok(Self::Rearm(target)),
            "set" => {
                if rest.is_empty() {
                    return Err(CommandError::MissingArgument {
                        command: "set",
                        argument: "attr",
                    });
                }
                // `set speed 1500`、`set speed=1500`、`set auto-open`
                let (name, value) = match rest.split_once(char::is_whitespace) {
                    Some((name, value)) if !name.contains('=') => {
                        (name.to_string(), value.trim().to_string())
                    }
                    _ => ElementAttributes::parse_assignment(rest),
                };
                Ok(Self::Set { name, value })
            }
            "unset" => match target {
                Some(name) => Ok(Self::Unset { name }),
                None => Err(CommandError::MissingArgument {
                    command: "unset",
                    argument: "attr",
                }),
            },
            "status" => Ok(Self::Status),
            "quit" | "exit" => Ok(Self::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}
