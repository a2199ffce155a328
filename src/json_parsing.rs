use{
    serde::{Serialize, de::DeserializeOwned},
    serde_json::Value,
    std::{fs::File, io::BufReader, process::exit},
    log::info,
    crate::error::AppError,
};

/// Reads the parameter struct from the json file. Without a file the
/// default parameters are printed as an example and the program exits.
pub fn parse<T>(file: Option<&String>) -> Result<(T, Value), AppError>
where T: Default + Serialize + DeserializeOwned
{
    match file
    {
        None => {
            let example = T::default();
            serde_json::to_writer_pretty(std::io::stdout(), &example)?;
            println!();
            exit(0);
        },
        Some(path) => {
            info!("reading parameters from {path}");
            let reader = BufReader::new(File::open(path)?);
            let json: Value = serde_json::from_reader(reader)?;
            let param = parse_value(json.clone())?;
            Ok((param, json))
        }
    }
}

pub fn parse_value<T>(json: Value) -> Result<T, AppError>
where T: DeserializeOwned
{
    Ok(serde_json::from_value(json)?)
}

/// reads any json file into `T`
pub fn read_json<T>(path: &str) -> Result<T, AppError>
where T: DeserializeOwned
{
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}
