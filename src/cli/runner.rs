use crate::{
    cli::{
        args::parse_value, AssignArgs, Cli, Commands, CopyArgs, DeleteArgs, GetArgs, OrderKeysArgs,
        SaveArgs, SetArgs,
    },
    data_file::{DataFile, DataPath, LoadOptions, SaveOptions},
    error::{Error, Result},
    ext::PathExt,
    intermodular::{CopyOptions, Intermodular, IntermodularOptions},
};
use serde::Serialize;
use std::path::Path;

/// Runs one subcommand and returns the text to print on stdout.
pub struct Runner<'a> {
    cli: &'a Cli,
}

impl<'a> Runner<'a> {
    pub fn new(cli: &'a Cli) -> Self {
        Self { cli }
    }

    pub fn run(self) -> Result<Option<String>> {
        match &self.cli.command {
            Commands::Get(args) => self.get(args),
            Commands::Set(args) => self.set(args).map(Some),
            Commands::Delete(args) => self.delete(args).map(Some),
            Commands::Assign(args) => self.assign(args).map(Some),
            Commands::OrderKeys(args) => self.order_keys(args).map(Some),
            Commands::Copy(args) => self.copy(args).map(Some),
        }
    }

    /// `None` when the path does not exist.
    fn get(&self, args: &GetArgs) -> Result<Option<String>> {
        let file = load(&args.file, &SaveArgs::default())?;
        file.get(args.path.as_str()).map(to_json).transpose()
    }

    fn set(&self, args: &SetArgs) -> Result<String> {
        let mut file = load(&args.file, &args.save)?;
        file.set_if(args.path.as_str(), parse_value(&args.value), &args.conditions.to_condition());
        save(file, &args.save)
    }

    fn delete(&self, args: &DeleteArgs) -> Result<String> {
        let mut file = load(&args.file, &args.save)?;
        file.delete_if(args.path.as_str(), &args.conditions.to_condition());
        save(file, &args.save)
    }

    fn assign(&self, args: &AssignArgs) -> Result<String> {
        let mut file = load(&args.file, &args.save)?;
        let data = parse_value(&args.data);
        if !data.is_object() {
            return Err(Error::Other(anyhow::anyhow!(
                "Only a JSON object can be assigned, got: {}",
                args.data
            )));
        }
        file.assign_if(DataPath::from(args.path.as_deref()), data, &args.conditions.to_condition());
        save(file, &args.save)
    }

    fn order_keys(&self, args: &OrderKeysArgs) -> Result<String> {
        let mut file = load(&args.file, &args.save)?;
        let path = DataPath::from(args.path.as_deref());
        if args.keys.is_empty() {
            file.sort_keys_of(path);
        } else {
            file.order_keys_of(path, &args.keys);
        }
        save(file, &args.save)
    }

    fn copy(&self, args: &CopyArgs) -> Result<String> {
        let intermodular = Intermodular::new(IntermodularOptions {
            source: Some(args.source.clone()),
            target: Some(args.target.clone()),
            overwrite: args.overwrite,
            ..IntermodularOptions::default()
        })?;
        let options = CopyOptions {
            ignore: args.ignore.clone(),
            exclude_dir_from_return: args.files_only,
            ..CopyOptions::default()
        };
        let copied = intermodular.copy(&args.path, args.target_path.as_deref(), &options)?;
        let copied = copied.iter().map(|path| path.to_str_checked()).collect::<Result<Vec<_>>>()?;
        to_json(&copied)
    }
}

fn load(path: &Path, save: &SaveArgs) -> Result<DataFile> {
    DataFile::load(
        path,
        LoadOptions {
            default_format: save.default_format,
            short_path: Some(path.display().to_string()),
            ..LoadOptions::default()
        },
    )
}

/// Saves `file` and returns its modified keys as JSON.
fn save(mut file: DataFile, args: &SaveArgs) -> Result<String> {
    let status = file.save_with(SaveOptions { force: args.force })?;
    log::debug!("{}: {:?}", file.short_path(), status);
    to_json(&file.modified_keys())
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Runs the subcommand of `cli`.
pub fn run(cli: &Cli) -> Result<Option<String>> {
    Runner::new(cli).run()
}
