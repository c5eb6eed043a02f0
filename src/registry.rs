// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The name to category map.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::PoisonError;
use std::sync::RwLock;
use std::sync::RwLockReadGuard;
use std::sync::RwLockWriteGuard;

use crate::Category;
use crate::Config;
use crate::ConsoleWriter;
use crate::DefaultTrap;
use crate::Error;
use crate::ErrorKind;
use crate::FileWriter;
use crate::Filter;
use crate::Layout;
use crate::Level;
use crate::Trap;
use crate::Writer;
use crate::writer::ConsoleWriterBuilder;

/// Owns the console writer and the configured categories.
///
/// A registry is an explicit context: create one at startup, load a [`Config`] or register
/// categories by hand, hand out [`Category`] handles with [`Registry::get`], and call
/// [`Registry::close`] at shutdown to flush every writer. Dropping the registry closes it too.
///
/// Categories are immutable snapshots. Loading a configuration replaces map entries, so handles
/// obtained earlier keep logging through the filters they were created with.
///
/// # Examples
///
/// ```
/// use catlog::Registry;
///
/// let registry = Registry::new();
/// let app = registry.get("app");
/// app.info("started");
/// registry.close();
/// ```
#[derive(Debug)]
pub struct Registry {
    console: Arc<ConsoleWriter>,
    default_layout: Arc<Layout>,
    trap: Arc<dyn Trap>,
    categories: RwLock<Categories>,
    fallbacks: RwLock<Categories>,
}

type Categories = HashMap<String, Arc<Category>>;

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Create an empty registry reporting errors to [`DefaultTrap`].
    pub fn new() -> Self {
        Self::with_trap(DefaultTrap::default())
    }

    /// Create an empty registry whose console writer, loaded file writers and loaded filters
    /// report errors to `trap`.
    pub fn with_trap(trap: impl Trap) -> Self {
        let trap: Arc<dyn Trap> = Arc::new(trap);
        let console = ConsoleWriterBuilder::new()
            .shared_trap(trap.clone())
            .build();
        Self {
            console: Arc::new(console),
            default_layout: Arc::new(Layout::default()),
            trap,
            categories: RwLock::new(HashMap::new()),
            fallbacks: RwLock::new(HashMap::new()),
        }
    }

    /// The console writer shared by every category that logs to the console.
    pub fn console(&self) -> &Arc<ConsoleWriter> {
        &self.console
    }

    /// The category registered under `name`.
    ///
    /// Unknown names are not an error: they get a category logging everything from
    /// [`Level::Debug`] up to the console with the default layout. That category is cached
    /// apart from the registered ones, so a later [`Registry::register`] or
    /// [`Registry::load`] still takes precedence for the name.
    pub fn get(&self, name: &str) -> Arc<Category> {
        if let Some(category) = read(&self.categories).get(name) {
            return category.clone();
        }
        if let Some(category) = read(&self.fallbacks).get(name) {
            return category.clone();
        }

        write(&self.fallbacks)
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(self.default_category(name)))
            .clone()
    }

    /// Whether `name` has been registered or configured.
    pub fn contains(&self, name: &str) -> bool {
        read(&self.categories).contains_key(name)
    }

    /// Names of the registered categories, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = read(&self.categories).keys().cloned().collect();
        names.sort();
        names
    }

    /// Register `category`, replacing any category with the same name.
    pub fn register(&self, category: Category) -> Arc<Category> {
        let category = Arc::new(category);
        write(&self.categories)
            .insert(category.name().to_string(), category.clone());
        category
    }

    /// Build the files, layouts and categories described by `config`.
    ///
    /// Filters of a category that is already registered are appended after its existing ones.
    /// Categories that are disabled or have no filters are skipped. Nothing is committed if
    /// any filter refers to an unknown layout or output; the file writers created so far are
    /// closed and the error is returned.
    pub fn load(&self, config: &Config) -> Result<(), Error> {
        let mut files = HashMap::new();
        match self.build_categories(config, &mut files) {
            Ok(categories) => {
                let mut registered = write(&self.categories);
                for category in categories {
                    registered.insert(category.name().to_string(), Arc::new(category));
                }
                Ok(())
            }
            Err(err) => {
                for writer in files.values() {
                    writer.close();
                }
                Err(err)
            }
        }
    }

    /// Close every writer reachable from the registry and forget all categories.
    ///
    /// Blocks until queued records are written. Calling it again is a no-op. Handles obtained
    /// earlier stay usable, but their writes fail and are reported to the trap.
    pub fn close(&self) {
        let categories = std::mem::take(&mut *write(&self.categories));
        write(&self.fallbacks).clear();
        for category in categories.values() {
            for filter in category.filters() {
                for writer in filter.writers() {
                    writer.close();
                }
            }
        }
        self.console.close();
    }

    fn build_categories(
        &self,
        config: &Config,
        files: &mut HashMap<String, Arc<FileWriter>>,
    ) -> Result<Vec<Category>, Error> {
        let mut layouts: HashMap<&str, Arc<Layout>> = HashMap::new();
        let mut categories = vec![];

        for (name, category_config) in &config.categories {
            if !category_config.enable || category_config.filters.is_empty() {
                continue;
            }

            let mut category = match read(&self.categories).get(name) {
                Some(existing) => Category::clone(existing),
                None => Category::new(name.as_str()),
            };

            for filter_config in &category_config.filters {
                let layout_name = filter_config.layout.as_str();
                let layout = match layouts.get(layout_name) {
                    Some(layout) => layout.clone(),
                    None => {
                        let template = config.layouts.get(layout_name).ok_or_else(|| {
                            Error::new(ErrorKind::InvalidConfig, "layout not found in log config")
                                .with_context("category", name)
                                .with_context("layout", layout_name)
                        })?;
                        let layout = Arc::new(Layout::compile(template));
                        layouts.insert(layout_name, layout.clone());
                        layout
                    }
                };

                let mut filter = Filter::new(name.as_str(), filter_config.threshold(), layout)
                    .with_shared_trap(self.trap.clone());
                for output in &filter_config.output {
                    filter = filter.with_writer(self.output(config, files, name, output)?);
                }
                category.add_filter(filter);
            }

            categories.push(category);
        }

        Ok(categories)
    }

    fn output(
        &self,
        config: &Config,
        files: &mut HashMap<String, Arc<FileWriter>>,
        category: &str,
        output: &str,
    ) -> Result<Arc<dyn Writer>, Error> {
        if output == "console" {
            return Ok(self.console.clone());
        }
        if let Some(file) = files.get(output) {
            return Ok(file.clone());
        }

        let file_config = config.files.get(output).ok_or_else(|| {
            Error::new(ErrorKind::InvalidConfig, "output not found in log config")
                .with_context("category", category)
                .with_context("output", output)
        })?;
        let file = FileWriter::builder(&file_config.filename)
            .policy(file_config.policy())
            .shared_trap(self.trap.clone())
            .build();
        let file = Arc::new(file);
        files.insert(output.to_string(), file.clone());
        Ok(file)
    }

    fn default_category(&self, name: &str) -> Category {
        let filter = Filter::new(name, Level::Debug, self.default_layout.clone())
            .with_writer(self.console.clone())
            .with_shared_trap(self.trap.clone());
        Category::new(name).with_filter(filter)
    }
}

fn read(lock: &RwLock<Categories>) -> RwLockReadGuard<'_, Categories> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write(lock: &RwLock<Categories>) -> RwLockWriteGuard<'_, Categories> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

impl Drop for Registry {
    fn drop(&mut self) {
        self.close();
    }
}
