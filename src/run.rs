use crate::args::{Invocation, Run};
use serde_yaml::from_reader;
use std::fs::File;
use thiserror::Error;

pub fn run(invocation: Invocation) -> Result<(), String> {
    match invocation {
        Invocation::Run(run) => run_yaml(run).map_err(|e| format!("{}", e)),
        Invocation::List(list) => crate::list::list(list).map_err(|e| format!("{}", e)),
        Invocation::Probe(probe) => crate::probe::probe(&probe).map_err(|e| format!("{}", e)),
        Invocation::Send(send) => crate::send::send(&send).map_err(|e| format!("{}", e)),
        Invocation::Reset(reset) => crate::send::reset(&reset).map_err(|e| format!("{}", e)),
        Invocation::Rate(rate) => crate::send::rate(&rate).map_err(|e| format!("{}", e)),
        Invocation::Interval(interval) => {
            crate::send::interval(&interval).map_err(|e| format!("{}", e))
        }
        Invocation::Listen(listen) => crate::listen::listen(&listen).map_err(|e| format!("{}", e)),
        Invocation::Compose(compose) => {
            crate::compose::compose(&compose).map_err(|e| format!("{}", e))
        }
        Invocation::Verify(verify) => crate::verify::verify(&verify).map_err(|e| format!("{}", e)),
    }
}

fn run_yaml(opts: Run) -> Result<(), RunError> {
    let file = File::open(opts.config)?;
    let invocation = from_reader(file)?;
    run(invocation).map_err(RunError::Cmd)
}

#[derive(Error, Debug)]
pub enum RunError {
    #[error("Could not open specified YAML configuration file: {0}")]
    IO(#[from] std::io::Error),
    #[error("Could not parse specified YAML configuration file: {0}")]
    Deserialize(#[from] serde_yaml::Error),
    #[error("{0}")]
    Cmd(String),
}

#[cfg(test)]
mod test {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn missing_config() {
        let err = run_yaml(Run {
            config: PathBuf::from("demos/does_not_exist.yaml"),
        })
        .unwrap_err();
        assert!(matches!(err, RunError::IO(_)), "Unexpected error: {:?}", err);
    }

    #[test]
    fn offline_invocation_from_yaml() {
        let invocation: Invocation =
            serde_yaml::from_str("compose:\n  class: 0x0A\n  id: 0x04\n").unwrap();
        assert_eq!(run(invocation), Ok(()));
    }
}
