/// Builds the argument vector a test server is started with, mirroring what
/// an operator would pass to `memtextd` on the command line.
pub struct MemtextdServerParamsBuilder {
    port: u16,
    memory_limit: Option<String>,
    item_size_limit: Option<String>,
    timeout_secs: Option<u32>,
}

impl MemtextdServerParamsBuilder {
    pub fn new() -> MemtextdServerParamsBuilder {
        MemtextdServerParamsBuilder {
            port: 0,
            memory_limit: None,
            item_size_limit: None,
            timeout_secs: None,
        }
    }

    pub fn with_port(&mut self, port: u16) -> &mut Self {
        self.port = port;
        self
    }

    #[allow(dead_code)]
    pub fn with_memory_limit(&mut self, memory_limit: &str) -> &mut Self {
        self.memory_limit = Some(memory_limit.to_string());
        self
    }

    #[allow(dead_code)]
    pub fn with_item_size_limit(&mut self, item_size_limit: &str) -> &mut Self {
        self.item_size_limit = Some(item_size_limit.to_string());
        self
    }

    #[allow(dead_code)]
    pub fn with_timeout_secs(&mut self, timeout_secs: u32) -> &mut Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }

    pub fn build(&self) -> Vec<String> {
        let mut args = vec![
            "memtextd".to_string(),
            "--port".to_string(),
            self.port.to_string(),
            "--threads".to_string(),
            "2".to_string(),
        ];
        if let Some(memory_limit) = &self.memory_limit {
            args.push("--memory-limit".to_string());
            args.push(memory_limit.clone());
        }
        if let Some(item_size_limit) = &self.item_size_limit {
            args.push("--item-size-limit".to_string());
            args.push(item_size_limit.clone());
        }
        if let Some(timeout_secs) = self.timeout_secs {
            args.push("--timeout-secs".to_string());
            args.push(timeout_secs.to_string());
        }
        args
    }
}

impl Default for MemtextdServerParamsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
