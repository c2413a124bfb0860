/*!

This is the long-form manual for `precinct_stats` and `precinctstats`.

## Pipeline

A dataset goes through the following steps:

1. every raw record is normalized into a [`VoterRecord`](crate::VoterRecord)
   (race category, party code, voted flag, age, precinct id)
2. the records are aggregated into counts. Above the chunk size (5000 by
   default), the records are split in chunks that are aggregated independently
   (in parallel by default) and then merged
3. the rates (turnout, average age, majority party and race, density) are
   derived once, from the merged counts
4. if a census record is available for the county, it is allocated to each
   precinct in proportion to its registered voters
5. the summary figures are computed

The result does not depend on the chunk size or on the order in which chunks
are merged. Only counts and sums are merged; rates are never averaged.

## Input formats

The following formats are supported for voter files:
* `json` an array of objects, or an object holding such an array (under
  `voters`, `records`, `data`, `rows` or any other key). The first array that
  contains objects is used
* `csv` Comma Separated Values with a header row
* `xlsx` Excel spreadsheet with a header row

Column and field names are matched without regard to case, spaces or
underscores:

| field    | accepted names                                   |
|----------|--------------------------------------------------|
| precinct | `precinct`, `precinct_id`, `prec_id`, `pct`, `precinct_number`, `precinct_name` |
| age      | `age`                                            |
| race     | `race`, `ethnicity`                              |
| party    | `party`, `party_code`, `party_affiliation`       |
| voted    | `voted`, `has_voted`, `voted_flag`               |

### Data quality

No individual record can stop the processing:
* the voted flag is true for `true`, `1`, `"1"`, `"true"`, `"yes"`, `"y"`.
  Anything else, including a missing value, is false.
* an age outside of 18 to 120, or that cannot be read, is left out of the
  average age and of the age groups. Text such as `"42.0"` is read as 42
* a race that is not recognized is `Unknown`, an empty party is `Unknown`
* a record without a precinct is only counted in the dataset-wide tallies

A file that is neither an array of records nor an object holding one is
rejected.

### Boundaries

A GeoJSON `FeatureCollection`. The precinct id of each feature is read from
its properties, under the same names as in voter files, then `name` and `id`. The geometry is not used.

### Census

A JSON object with the county figures:

```json
{
  "votingAgePopulation": 52000,
  "medianIncome": 61000,
  "raceDistribution": { "White": 0.6, "Black": 0.2 },
  "educationLevels": { "High school": 18000, "Bachelor's degree": 9000 },
  "housingUnits": 21000,
  "homeownershipRate": 0.64,
  "precinctEstimates": { "101": { "medianIncome": 48000 } }
}
```

## Configuration

```json
{
  "outputSettings": { "datasetName": "Example county", "county": "Example", "state": "XX" },
  "voterFileSources": [ { "provider": "json", "filePath": "voters.json" } ],
  "boundaryFile": "precincts.geojson",
  "censusFile": "census.json",
  "rules": { "chunkSize": 5000, "parallel": true },
  "turnoutTrends": [ { "label": "2016", "turnout": 61.2 } ]
}
```

All the paths are relative to the directory of the configuration file. The
command line flags `--input`, `--input-type`, `--census`, `--boundaries` and
`--chunk-size` override the corresponding entries.

*/
