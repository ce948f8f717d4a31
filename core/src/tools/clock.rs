use crate::traits::{Tool, ToolError};
use async_trait::async_trait;
use chrono::{DateTime, Local};

pub const CLOCK_TOOL_NAME: &str = "get_current_datetime";
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

pub struct ClockTool<C = SystemClock> {
    clock: C,
}

impl ClockTool {
    pub fn new() -> Self {
        Self { clock: SystemClock }
    }
}

impl Default for ClockTool {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> ClockTool<C> {
    pub fn with_clock(clock: C) -> Self {
        Self { clock }
    }

    pub fn current(&self) -> String {
        self.clock.now().format(DATETIME_FORMAT).to_string()
    }
}

#[async_trait]
impl<C: Clock> Tool for ClockTool<C> {
    fn name(&self) -> &str {
        CLOCK_TOOL_NAME
    }

    fn description(&self) -> &str {
        "Retorna a data e hora atuais no fuso horário local. Útil para perguntas que dependem de \"agora\", \"hoje\" ou \"neste momento\". Não precisa de entrada."
    }

    async fn invoke(&self, _input: &str) -> Result<String, ToolError> {
        Ok(self.current())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDateTime, TimeZone};
    use std::sync::Mutex;

    struct SteppingClock {
        times: Mutex<Vec<DateTime<Local>>>,
    }

    impl SteppingClock {
        fn new(stamps: &[&str]) -> Self {
            let mut times: Vec<_> = stamps.iter().map(|s| local(s)).collect();
            times.reverse();
            Self {
                times: Mutex::new(times),
            }
        }
    }

    impl Clock for SteppingClock {
        fn now(&self) -> DateTime<Local> {
            self.times.lock().unwrap().pop().unwrap()
        }
    }

    fn local(stamp: &str) -> DateTime<Local> {
        let naive = NaiveDateTime::parse_from_str(stamp, "%Y-%m-%d %H:%M:%S%.f").unwrap();
        Local.from_local_datetime(&naive).earliest().unwrap()
    }

    #[tokio::test]
    async fn same_second_formats_identically() {
        let tool = ClockTool::with_clock(SteppingClock::new(&[
            "2024-05-01 09:15:30.100",
            "2024-05-01 09:15:30.900",
        ]));

        let first = tool.invoke("").await.unwrap();
        let second = tool.invoke("ignored").await.unwrap();
        assert_eq!(first, "2024-05-01 09:15:30");
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn date_advances_across_midnight() {
        let tool = ClockTool::with_clock(SteppingClock::new(&[
            "2024-05-01 23:59:59.500",
            "2024-05-02 00:00:00.200",
        ]));

        let before = tool.invoke("").await.unwrap();
        let after = tool.invoke("").await.unwrap();
        assert_eq!(&before[..10], "2024-05-01");
        assert_eq!(&after[..10], "2024-05-02");
        assert!(after > before);
    }

    #[test]
    fn system_clock_uses_expected_layout() {
        let tool = ClockTool::new();
        let now = tool.current();
        let parsed = NaiveDateTime::parse_from_str(&now, DATETIME_FORMAT).unwrap();
        let drift = Local::now().naive_local() - parsed;
        assert!(drift < Duration::seconds(5));
        assert_eq!(now.len(), 19);
    }
}
